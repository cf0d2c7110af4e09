// src/utils/mod.rs
pub mod error;
pub mod logging;
pub mod retry;

pub use error::AppError; // Re-export main error type for convenience

/// Truncates `text` to at most `max_chars` characters, marking the cut with
/// an ellipsis. Keeps error payloads and log lines bounded even when the
/// model returns kilobytes of garbage.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_leaves_short_text_alone() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn truncate_cuts_on_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        // Multi-byte chars count as one each.
        assert_eq!(truncate("日本語テキスト", 3), "日本語...");
    }
}
