//! Whitespace normalization applied to extracted text before chunking.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").expect("Invalid blank line regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("Invalid space regex"));

/// Normalizes extracted text.
///
/// - runs of three or more newlines (with any whitespace between them)
///   collapse to a single blank line
/// - runs of spaces collapse to one space
/// - NUL characters are removed
/// - leading and trailing whitespace is trimmed
///
/// Tabs, carriage returns and non-ASCII whitespace are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCleaner;

impl TextCleaner {
    /// Create a new cleaner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Clean a text.
    #[must_use]
    pub fn clean(&self, text: &str) -> String {
        let text = BLANK_LINE_RUN.replace_all(text, "\n\n");
        let text = SPACE_RUN.replace_all(&text, " ");
        text.replace('\0', "").trim().to_string()
    }
}
