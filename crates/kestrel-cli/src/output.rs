//! Formatted output helpers for CLI commands.

/// Marker for a definition that registered cleanly.
pub const OK: &str = "ok  ";
/// Marker for a definition that failed to register.
pub const FAIL: &str = "FAIL";
/// Marker for a definition that cannot be checked statically.
pub const SKIP: &str = "skip";

/// Renders a title underlined to its own width.
#[must_use]
pub fn heading(title: &str) -> String {
    let width = title.chars().count();
    format!("{title}\n{}", "\u{2550}".repeat(width))
}

/// Shortens `text` to at most `max` characters, marking the cut.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}\u{2026}")
}
