//! src/utils.rs
//! Shared utility functions used across the codebase

use std::fmt::Display;

/// Extension trait for Result to simplify error conversion to String.
///
/// Eliminates verbose `.map_err(|e| e.to_string())?` patterns at the MCP
/// tool boundary. Use `.str_err()?` instead.
pub trait ResultExt<T, E> {
    /// Convert the error type to String.
    fn str_err(self) -> Result<T, String>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    fn str_err(self) -> Result<T, String> {
        self.map_err(|e| e.to_string())
    }
}

/// Truncate a string to max length with ellipsis.
///
/// Cuts at a char boundary at or below `max_len` bytes; platform text is
/// Danish, so multi-byte characters are the norm, not the exception.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}
