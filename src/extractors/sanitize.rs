// src/extractors/sanitize.rs

// Leading markers, longest token first so "```json" is not eaten as "```".
const LEADING_FENCES: [&str; 4] = ["```json", "```", "`json", "`"];
const TRAILING_FENCES: [&str; 2] = ["```", "`"];

/// Strips a single optional leading markdown fence marker, a single optional
/// trailing one, and surrounding whitespace.
///
/// The model wraps otherwise-valid JSON in fences inconsistently across
/// calls. This stage is purely textual; it never parses JSON. An empty result
/// means the response carried nothing but formatting.
pub fn clean_model_response(raw: &str) -> &str {
    let mut text = raw.trim();

    for fence in LEADING_FENCES {
        if let Some(stripped) = text.strip_prefix(fence) {
            text = stripped;
            break;
        }
    }
    for fence in TRAILING_FENCES {
        if let Some(stripped) = text.strip_suffix(fence) {
            text = stripped;
            break;
        }
    }

    text.trim()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{"header":{"trade_name":"Acme"},"audit_paras":[]}"#;

    #[test]
    fn strips_json_tagged_fence() {
        let wrapped = format!("```json\n{}\n```", JSON);
        assert_eq!(clean_model_response(&wrapped), JSON);
    }

    #[test]
    fn strips_bare_fence_and_single_backticks() {
        assert_eq!(clean_model_response(&format!("```\n{}\n```", JSON)), JSON);
        assert_eq!(clean_model_response(&format!("`{}`", JSON)), JSON);
        assert_eq!(clean_model_response(&format!("`json\n{}\n`", JSON)), JSON);
    }

    #[test]
    fn clean_input_is_a_no_op() {
        assert_eq!(clean_model_response(JSON), JSON);
        // Idempotence: cleaning twice changes nothing further.
        assert_eq!(clean_model_response(clean_model_response(JSON)), JSON);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let padded = format!("  \n```json\n{}\n```  \n", JSON);
        assert_eq!(clean_model_response(&padded), JSON);
    }

    #[test]
    fn fence_only_responses_clean_to_empty() {
        assert_eq!(clean_model_response("```\n```"), "");
        assert_eq!(clean_model_response("``````"), "");
        assert_eq!(clean_model_response("   "), "");
        assert_eq!(clean_model_response(""), "");
    }

    #[test]
    fn only_one_marker_is_stripped_per_side() {
        // A second fence is content, not formatting.
        assert_eq!(clean_model_response("``````json x"), "```json x");
    }
}
