//! Store-ready records built from chunks.

use ragdoc_core::DocumentChunk;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum characters kept in `content_preview` before `...` is appended.
pub const PREVIEW_CHARS: usize = 500;

/// Metadata key holding the content preview.
pub const PREVIEW_KEY: &str = "content_preview";

/// A chunk prepared for a vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Chunk ID
    pub id: String,
    /// Whitespace-normalized text to embed
    pub text: String,
    /// Flat metadata with nulls removed, plus `content_preview`
    pub metadata: BTreeMap<String, Value>,
}

impl VectorRecord {
    /// Build a record from a chunk.
    #[must_use]
    pub fn from_chunk(chunk: &DocumentChunk) -> Self {
        let text = normalize_whitespace(&chunk.content);

        let mut metadata: BTreeMap<String, Value> = match serde_json::to_value(&chunk.metadata) {
            Ok(Value::Object(map)) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            _ => BTreeMap::new(),
        };
        metadata.insert(PREVIEW_KEY.to_string(), Value::String(preview(&text)));

        Self {
            id: chunk.id.clone(),
            text,
            metadata,
        }
    }

    /// Source file name, if present in the metadata.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.metadata.get("file_name").and_then(Value::as_str)
    }
}

/// Collapse every whitespace run (newlines included) to a single space.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn preview(normalized: &str) -> String {
    if normalized.chars().count() > PREVIEW_CHARS {
        let mut cut: String = normalized.chars().take(PREVIEW_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        normalized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdoc_core::{ChunkMetadata, FileType};

    fn chunk(content: &str, section: Option<&str>, page: Option<u32>) -> DocumentChunk {
        DocumentChunk {
            id: "guide.md_0".to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                file_name: "guide.md".to_string(),
                file_type: FileType::Markdown,
                document_title: "Guide".to_string(),
                chunk_index: 0,
                token_count: 3,
                char_count: content.chars().count(),
                section_header: section.map(str::to_string),
                page_number: page,
            },
        }
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a\n\nb\r\n  c\t d "), "a b c d");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_metadata_is_flat() {
        let record = VectorRecord::from_chunk(&chunk("Hello\n\nworld", Some("Intro"), None));

        assert_eq!(record.id, "guide.md_0");
        assert_eq!(record.text, "Hello world");
        assert_eq!(record.metadata["file_name"], "guide.md");
        assert_eq!(record.metadata["file_type"], ".md");
        assert_eq!(record.metadata["document_title"], "Guide");
        assert_eq!(record.metadata["chunk_index"], 0);
        assert_eq!(record.metadata["section_header"], "Intro");
        assert_eq!(record.metadata[PREVIEW_KEY], "Hello world");
        assert_eq!(record.file_name(), Some("guide.md"));
    }

    #[test]
    fn test_null_fields_are_stripped() {
        let record = VectorRecord::from_chunk(&chunk("text", None, None));
        assert!(!record.metadata.contains_key("section_header"));
        assert!(!record.metadata.contains_key("page_number"));
        assert!(record.metadata.values().all(|v| !v.is_null()));
    }

    #[test]
    fn test_page_number_kept() {
        let record = VectorRecord::from_chunk(&chunk("text", None, Some(4)));
        assert_eq!(record.metadata["page_number"], 4);
    }

    #[test]
    fn test_preview_truncated() {
        let long = "é".repeat(PREVIEW_CHARS + 10);
        let record = VectorRecord::from_chunk(&chunk(&long, None, None));
        let preview = record.metadata[PREVIEW_KEY].as_str().unwrap();

        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(record.text, long);
    }

    #[test]
    fn test_preview_at_limit_not_truncated() {
        let exact = "x".repeat(PREVIEW_CHARS);
        let record = VectorRecord::from_chunk(&chunk(&exact, None, None));
        assert_eq!(record.metadata[PREVIEW_KEY], exact.as_str());
    }
}
