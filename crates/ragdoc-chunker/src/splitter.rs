//! Structural splitters.
//!
//! Pure functions over text that produce ordered segments for the chunking
//! engine: paragraphs, sentences and Markdown sections.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Splits text into ordered segments.
pub trait TextSplitter {
    /// Segment type produced by this splitter.
    type Segment;

    /// Split `text`. Empty input yields no segments.
    fn split(&self, text: &str) -> Vec<Self::Segment>;
}

// ============================================================================
// Paragraphs
// ============================================================================

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("Invalid paragraph break regex"));

/// Splits on blank lines, trimming each paragraph and dropping empty ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphSplitter;

impl TextSplitter for ParagraphSplitter {
    type Segment = String;

    fn split(&self, text: &str) -> Vec<String> {
        PARAGRAPH_BREAK
            .split(text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ============================================================================
// Sentences
// ============================================================================

static ABBREVIATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(Ph\.D|M\.D|B\.A|M\.A|i\.e|e\.g|Mrs|Prof|Blvd|Corp|Inc|Ltd|Ave|Dr|Mr|Ms|Sr|Jr|vs|etc|Co|St)\.",
    )
    .expect("Invalid abbreviation regex")
});

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("Invalid sentence end regex"));

/// Abbreviations that precede a name or a term and never end a sentence.
const PREFIX_ABBREVIATIONS: &[&str] = &["dr", "mr", "mrs", "ms", "prof", "st", "vs", "i.e", "e.g"];

/// Stands in for a protected period while splitting (Unicode private use).
const PLACEHOLDER: char = '\u{E000}';

/// Splits on `.`, `!` or `?` followed by whitespace, keeping abbreviation
/// periods intact.
///
/// Title abbreviations ("Dr.", "Mr.", "vs.") never end a sentence. Suffix
/// abbreviations ("Inc.", "etc.", "Ph.D.") end one only when the next word is
/// capitalized, so "Acme Inc. He left." is two sentences while
/// "Acme Inc. announced" stays one. Periods inside initials such as "U.S.A."
/// are not followed by whitespace and never split.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceSplitter;

impl SentenceSplitter {
    fn protect(text: &str) -> String {
        ABBREVIATION
            .replace_all(text, |caps: &Captures<'_>| {
                let whole = &caps[0];
                let end = caps.get(0).map_or(text.len(), |m| m.end());
                if Self::ends_sentence(&caps[1], &text[end..]) {
                    whole.to_string()
                } else {
                    whole.replace('.', &PLACEHOLDER.to_string())
                }
            })
            .into_owned()
    }

    fn ends_sentence(abbreviation: &str, rest: &str) -> bool {
        let lower = abbreviation.to_lowercase();
        if PREFIX_ABBREVIATIONS.contains(&lower.as_str()) {
            return false;
        }
        rest.trim_start()
            .chars()
            .next()
            .is_some_and(char::is_uppercase)
    }
}

impl TextSplitter for SentenceSplitter {
    type Segment = String;

    fn split(&self, text: &str) -> Vec<String> {
        let protected = Self::protect(text);
        let mut sentences = Vec::new();
        let mut start = 0;

        for boundary in SENTENCE_END.find_iter(&protected) {
            // The punctuation mark is a single ASCII byte.
            sentences.push(&protected[start..=boundary.start()]);
            start = boundary.end();
        }
        sentences.push(&protected[start..]);

        sentences
            .into_iter()
            .map(|s| s.trim().replace(PLACEHOLDER, "."))
            .filter(|s| !s.is_empty())
            .collect()
    }
}

// ============================================================================
// Markdown Sections
// ============================================================================

/// A header-bounded span of Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownSection {
    /// Header text without `#` marks, empty for text before the first header
    pub header: String,
    /// Section text, including the header line
    pub content: String,
    /// Number of leading `#` characters, 0 without a header
    pub level: usize,
}

impl MarkdownSection {
    /// The header, or `None` for a header-less section.
    #[must_use]
    pub fn heading(&self) -> Option<&str> {
        if self.header.is_empty() {
            None
        } else {
            Some(&self.header)
        }
    }
}

/// Splits Markdown at every line starting with `#`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownSectionSplitter;

impl TextSplitter for MarkdownSectionSplitter {
    type Segment = MarkdownSection;

    fn split(&self, text: &str) -> Vec<MarkdownSection> {
        let mut sections = Vec::new();
        let mut current = MarkdownSection {
            header: String::new(),
            content: String::new(),
            level: 0,
        };

        for line in text.split('\n') {
            let stripped = line.trim();
            if stripped.starts_with('#') {
                let level = stripped.chars().take_while(|&c| c == '#').count();
                let header = stripped.trim_matches('#').trim().to_string();
                let next = MarkdownSection {
                    header,
                    content: format!("{line}\n"),
                    level,
                };
                let previous = std::mem::replace(&mut current, next);
                if !previous.content.trim().is_empty() {
                    sections.push(previous);
                }
            } else {
                current.content.push_str(line);
                current.content.push('\n');
            }
        }

        if !current.content.trim().is_empty() {
            sections.push(current);
        }
        sections
    }
}
