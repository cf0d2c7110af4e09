// src/extractors/dar.rs
use std::future::Future;
use std::time::Duration;

use crate::extractors::report::{report_from_json, ParsedDarReport};
use crate::extractors::sanitize::clean_model_response;
use crate::gemini::client::{GenerateContent, GeminiClient};
use crate::gemini::prompt::build_extraction_prompt;
use crate::utils::error::{AttemptError, GeminiError};
use crate::utils::retry::{retry_with_backoff, RetryDecision, RetryFailure};
use crate::utils::truncate;

/// Shorter inputs carry no extractable report; rejected before any network call.
pub const MIN_SOURCE_TEXT_CHARS: usize = 50;

/// Placeholder left in configurations that were never filled with a real key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Prefixes the upstream PDF-to-text step uses to report its own failures.
/// Input starting with one of these is an error message, not document text,
/// and is propagated verbatim.
pub const UPSTREAM_ERROR_PREFIXES: [&str; 2] =
    ["Error processing PDF", "Error preprocessing PDF text"];

/// Extra attempts after the first failed one, unless the caller overrides.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

const DIAGNOSTIC_LIMIT: usize = 200;
const EXCERPT_LIMIT: usize = 500;

/// Extracts a structured DAR record from raw report text.
///
/// Never returns an error and never panics: every failure path ends in a
/// returned record whose `parsing_errors` explains what happened, so the
/// caller can always persist something and route it to human review.
pub async fn extract_report(api_key: &str, source_text: &str, max_retries: u32) -> ParsedDarReport {
    if api_key.trim().is_empty() || api_key == API_KEY_PLACEHOLDER {
        return ParsedDarReport::from_error("Gemini API Key not configured.");
    }

    let client = match GeminiClient::new(api_key) {
        Ok(client) => client,
        Err(e) => {
            return ParsedDarReport::from_error(format!("Failed to initialize Gemini client: {}", e))
        }
    };

    run_pipeline(&client, source_text, max_retries, |wait| {
        tokio::time::sleep(wait)
    })
    .await
}

/// The per-document pipeline: preflight, then up to `max_retries + 1` rounds
/// of call -> sanitize -> parse -> coerce, with classified backoff between
/// rounds. Generic over the model and the sleep so tests can inject both.
pub(crate) async fn run_pipeline<M, Sl, SlFut>(
    model: &M,
    source_text: &str,
    max_retries: u32,
    sleep: Sl,
) -> ParsedDarReport
where
    M: GenerateContent,
    Sl: Fn(Duration) -> SlFut,
    SlFut: Future<Output = ()>,
{
    // Preflight: definitional invalidity, not transient failure. No network
    // call is made for any of these.
    if let Some(prefix) = UPSTREAM_ERROR_PREFIXES
        .iter()
        .find(|prefix| source_text.starts_with(*prefix))
    {
        tracing::warn!(
            "Upstream text conversion already failed (prefix {:?}), skipping extraction",
            prefix
        );
        return ParsedDarReport::from_error(source_text);
    }
    if source_text.trim().chars().count() < MIN_SOURCE_TEXT_CHARS {
        tracing::warn!("Source text too short for extraction");
        return ParsedDarReport::from_error("Text content too short or empty for analysis.");
    }

    let prompt = build_extraction_prompt(source_text);
    tracing::info!(
        "Starting Gemini extraction ({} prompt chars, up to {} attempts)",
        prompt.chars().count(),
        max_retries + 1
    );

    let outcome = retry_with_backoff(
        max_retries,
        |attempt| run_attempt(model, &prompt, attempt),
        |error: &AttemptError, attempt| match error.retry_after(attempt) {
            Some(wait) => RetryDecision::Retry(wait),
            None => RetryDecision::Halt,
        },
        sleep,
    )
    .await;

    match outcome {
        Ok(report) => {
            match &report.parsing_errors {
                Some(note) => tracing::warn!("Extraction completed with fallback: {}", note),
                None => tracing::info!(
                    "Extraction succeeded: {} audit para(s)",
                    report.audit_paras.len()
                ),
            }
            report
        }
        Err(RetryFailure::Halted { error, attempts }) => {
            ParsedDarReport::from_error(terminal_message(&error, attempts))
        }
        Err(RetryFailure::Exhausted {
            last_error,
            attempts,
        }) => ParsedDarReport::from_error(format!(
            "Gemini extraction failed after {} attempts. Last error: {}",
            attempts,
            truncate(&last_error.to_string(), EXCERPT_LIMIT)
        )),
    }
}

/// One full attempt: model call, fence cleanup, JSON parse, record coercion.
async fn run_attempt<M: GenerateContent>(
    model: &M,
    prompt: &str,
    attempt: u32,
) -> Result<ParsedDarReport, AttemptError> {
    tracing::debug!("Gemini attempt {}", attempt);

    let raw = model.generate(prompt.to_string()).await?;

    let cleaned = clean_model_response(&raw);
    if cleaned.is_empty() {
        return Err(AttemptError::EmptyAfterClean);
    }

    let value: serde_json::Value = serde_json::from_str(cleaned).map_err(|e| {
        AttemptError::InvalidJson {
            message: truncate(&e.to_string(), DIAGNOSTIC_LIMIT),
            excerpt: truncate(cleaned, EXCERPT_LIMIT),
        }
    })?;

    report_from_json(value)
}

fn terminal_message(error: &AttemptError, attempts: u32) -> String {
    match error {
        AttemptError::Api(GeminiError::Billing(message)) => format!(
            "Billing issue detected: {}. Check that the account behind the API key is set up correctly.",
            truncate(message, DIAGNOSTIC_LIMIT)
        ),
        AttemptError::Api(GeminiError::Auth(message)) => format!(
            "Gemini rejected the API key: {}",
            truncate(message, DIAGNOSTIC_LIMIT)
        ),
        other => format!(
            "Gemini extraction failed terminally after {} attempt(s): {}",
            attempts,
            truncate(&other.to_string(), DIAGNOSTIC_LIMIT)
        ),
    }
}
