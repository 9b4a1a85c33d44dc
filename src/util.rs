// src/util.rs — Shared helpers

/// One-line, length-capped rendering of user text for log fields.
///
/// Newlines and runs of whitespace collapse to single spaces; the result is
/// cut at `max_chars` characters (not bytes) and marked with an ellipsis.
pub fn log_preview(s: &str, max_chars: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(log_preview("/start", 40), "/start");
    }

    #[test]
    fn test_newlines_collapse() {
        assert_eq!(log_preview("{\n  \"periods\": []\n}", 40), "{ \"periods\": [] }");
    }

    #[test]
    fn test_cut_counts_chars() {
        // Cyrillic letters are two bytes each
        assert_eq!(log_preview("Грузия", 3), "Гру…");
    }

    #[test]
    fn test_empty() {
        assert_eq!(log_preview("   ", 5), "");
    }
}
