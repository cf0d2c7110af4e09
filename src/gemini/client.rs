// src/gemini/client.rs
use crate::gemini::models::{
    ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part, SafetySetting,
};
use crate::utils::error::GeminiError;
use crate::utils::truncate;
use std::future::Future;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_MODEL: &str = "gemini-1.5-flash";
// The retry budget bounds attempts, not wall clock; without this a hung
// connection would stall an attempt forever.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Seam between the extraction pipeline and the remote model, so tests can
/// script responses without a network.
pub trait GenerateContent {
    /// One model invocation per call; never retries internally.
    fn generate(&self, prompt: String) -> impl Future<Output = Result<String, GeminiError>>;
}

/// Client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    /// Creates a client configured for structured extraction (single
    /// low-temperature candidate, permissive safety thresholds).
    pub fn new(api_key: &str) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GeminiError::classify(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_config: GenerationConfig::default(),
        })
    }

    /// Overrides the endpoint base URL. Tests point this at a local mock.
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[allow(dead_code)]
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    async fn call_generate(&self, prompt: String) -> Result<String, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            generationConfig: self.generation_config.clone(),
            safetySettings: SafetySetting::most_permissive(),
        };

        tracing::debug!("Calling Gemini model {}", GEMINI_MODEL);

        // Transport failures (DNS, refused connections, the request timeout)
        // all fold into the classified taxonomy rather than escaping raw.
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::classify(format!("Network request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Prefer the structured error envelope; fall back to the raw body.
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(envelope) => format!(
                    "{} {}: {}",
                    status,
                    envelope.error.status.unwrap_or_default(),
                    envelope.error.message.unwrap_or_default()
                ),
                Err(_) => format!("{}: {}", status, truncate(&body, 200)),
            };
            tracing::warn!("Gemini API error: {}", message);
            return Err(GeminiError::classify(message));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::classify(format!("Failed to decode Gemini response: {}", e)))?;

        match payload.primary_text() {
            Some(text) => {
                tracing::debug!("Gemini returned {} chars", text.chars().count());
                Ok(text)
            }
            None => Err(GeminiError::EmptyResponse),
        }
    }
}

impl GenerateContent for GeminiClient {
    async fn generate(&self, prompt: String) -> Result<String, GeminiError> {
        self.call_generate(prompt).await
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::TransientKind;
    use mockito::Matcher;

    const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn client_for(server: &mockito::Server) -> GeminiClient {
        GeminiClient::new("test-key")
            .expect("client build")
            .with_base_url(&server.url())
    }

    #[tokio::test]
    async fn returns_candidate_text_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"header\":{}}"}]},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await;

        let text = client_for(&server).call_generate("prompt".to_string()).await.unwrap();
        assert_eq!(text, "{\"header\":{}}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn classifies_quota_exhaustion_as_transient_quota() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(
                r#"{"error":{"code":429,"message":"Quota exceeded for requests per minute","status":"RESOURCE_EXHAUSTED"}}"#,
            )
            .create_async()
            .await;

        let error = client_for(&server)
            .call_generate("prompt".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            GeminiError::Transient {
                kind: TransientKind::Quota,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn classifies_bad_key_as_auth() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(
                r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key. [reason: API_KEY_INVALID]","status":"INVALID_ARGUMENT"}}"#,
            )
            .create_async()
            .await;

        let error = client_for(&server)
            .call_generate("prompt".to_string())
            .await
            .unwrap_err();
        assert!(matches!(error, GeminiError::Auth(_)));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let error = client_for(&server)
            .call_generate("prompt".to_string())
            .await
            .unwrap_err();
        assert!(matches!(error, GeminiError::EmptyResponse));
    }

    #[tokio::test]
    async fn non_json_error_body_still_classifies() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream connect error")
            .create_async()
            .await;

        let error = client_for(&server)
            .call_generate("prompt".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            GeminiError::Transient {
                kind: TransientKind::Generic,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn request_carries_permissive_safety_settings() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": {"candidateCount": 1, "temperature": 0.1},
                "safetySettings": [
                    {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE"},
                    {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE"},
                    {"category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE"},
                    {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE"}
                ]
            })))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await;

        client_for(&server).call_generate("prompt".to_string()).await.unwrap();
        mock.assert_async().await;
    }
}
