use crate::cache::ErrorKind;
use ratatui::prelude::Color;

/// Truncate to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Color of a page-level error state
pub fn error_color(kind: ErrorKind) -> Color {
  match kind {
    ErrorKind::NotFound => Color::Yellow,
    ErrorKind::ServerError | ErrorKind::NetworkError => Color::Red,
  }
}

/// Hint shown under a page-level error
pub fn error_hint(kind: ErrorKind) -> &'static str {
  match kind {
    ErrorKind::NotFound => "Nothing here. Press 'q' to go back.",
    ErrorKind::ServerError | ErrorKind::NetworkError => "Press 'r' to retry.",
  }
}
