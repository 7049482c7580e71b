//! Document title inference.
//!
//! Each file type has its own heuristics over the first lines of the
//! cleaned content. When none applies the title is derived from the file
//! name: `machine_learning-basics.md` becomes `Machine Learning Basics`.

use ragdoc_core::FileType;
use std::path::Path;

const MARKDOWN_SCAN_LINES: usize = 10;
const PDF_SCAN_LINES: usize = 20;
const TEXT_SCAN_LINES: usize = 5;

const PAGE_MARKER_PREFIX: &str = "--- Page";

/// Infers a human-readable title for a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTitleExtractor;

impl DocumentTitleExtractor {
    /// Create a new title extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Infer the title of a document of the given type.
    #[must_use]
    pub fn extract_title(&self, path: &Path, file_type: FileType, content: &str) -> String {
        let found = match file_type {
            FileType::Markdown => markdown_title(content),
            FileType::Pdf => pdf_title(content),
            FileType::Text => text_title(content),
        };
        found.unwrap_or_else(|| filename_to_title(path))
    }
}

/// First `# ` heading, else a line underlined with `===`.
fn markdown_title(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();
    let head = &lines[..lines.len().min(MARKDOWN_SCAN_LINES)];

    let heading = head.iter().find_map(|line| {
        let title = line.trim().strip_prefix("# ")?.trim();
        (!title.is_empty()).then(|| title.to_string())
    });
    if heading.is_some() {
        return heading;
    }

    head.iter().enumerate().find_map(|(i, line)| {
        let underlined = lines
            .get(i + 1)
            .is_some_and(|next| next.trim().starts_with("==="));
        let title = line.trim();
        (underlined && !title.is_empty()).then(|| title.to_string())
    })
}

/// A short title-case or upper-case line that is not a sentence.
fn pdf_title(content: &str) -> Option<String> {
    content
        .lines()
        .take(PDF_SCAN_LINES)
        .map(str::trim)
        .filter(|line| (11..200).contains(&line.chars().count()))
        .filter(|line| !line.starts_with(PAGE_MARKER_PREFIX))
        .find(|line| (is_title_case(line) || is_upper_case(line)) && !line.ends_with('.'))
        .map(str::to_string)
}

/// The first substantial line that is not a sentence.
fn text_title(content: &str) -> Option<String> {
    content
        .lines()
        .take(TEXT_SCAN_LINES)
        .map(str::trim)
        .find(|line| (6..200).contains(&line.chars().count()) && !line.ends_with('.'))
        .map(str::to_string)
}

/// Title-case the file stem, treating `_` and `-` as word separators.
#[must_use]
pub fn filename_to_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .replace(['_', '-'], " ");

    let title = stem
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Every cased run starts with one upper-case letter followed by lower-case letters.
fn is_title_case(line: &str) -> bool {
    let mut any_cased = false;
    let mut in_word = false;
    for c in line.chars() {
        if c.is_uppercase() {
            if in_word {
                return false;
            }
            in_word = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !in_word {
                return false;
            }
            any_cased = true;
        } else {
            in_word = false;
        }
    }
    any_cased
}

fn is_upper_case(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}
