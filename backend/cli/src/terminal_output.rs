//! Terminal output helpers for the one-shot commands.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

/// Characters of OCR text shown by `extract` before truncating.
pub const OCR_PREVIEW_CHARS: usize = 800;

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

fn paint(text: &str, style: &str) -> String {
    if supports_color() {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// `=== TITLE ===` banner.
pub fn section(title: &str) -> String {
    paint(&format!("=== {title} ==="), BOLD)
}

pub fn status_line(success: bool) -> String {
    if success {
        paint("success", GREEN)
    } else {
        paint("failed", RED)
    }
}

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("Total 42", 800), "Total 42");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "a".repeat(801);
        let out = truncate(&text, 800);
        assert_eq!(out.len(), 803);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééé", 2), "éé...");
    }
}
