// src/gemini/models.rs
#![allow(dead_code, non_snake_case)]
use serde::{Deserialize, Serialize};

/// Request body for the generateContent endpoint.
/// Example: POST https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generationConfig: GenerationConfig,
    pub safetySettings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// Generation parameters pinned for structured extraction: exactly one
/// candidate, near-zero temperature to minimize formatting drift, and an
/// output ceiling sized to the expected JSON record.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub candidateCount: u32,
    pub temperature: f32,
    pub maxOutputTokens: u32,
    pub stopSequences: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            candidateCount: 1,
            temperature: 0.1,
            maxOutputTokens: 4096,
            stopSequences: vec!["\n\n---".to_string(), "END_JSON".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    /// Structured extraction of audit text is never itself hazardous content;
    /// every harm category runs fully open so the default filters cannot
    /// silently swallow the response.
    pub fn most_permissive() -> Vec<SafetySetting> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .iter()
        .map(|category| SafetySetting {
            category: (*category).to_string(),
            threshold: "BLOCK_NONE".to_string(),
        })
        .collect()
    }
}

/// Successful response payload. Only the fields we read are modeled; the
/// endpoint returns more (usage metadata, safety ratings) that we ignore.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    pub finishReason: Option<String>,
}

impl GenerateContentResponse {
    /// The first candidate's concatenated text parts, if any.
    pub fn primary_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content.parts.iter().map(|part| part.text.as_str()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Error envelope returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<String>,
}
