//! Core types for ragdoc.
//!
//! This module contains all shared data structures used across ragdoc:
//!
//! ## Documents
//! - [`FileType`]: Supported source formats (PDF, Markdown, plain text)
//! - [`ProcessedDocument`]: One fully-extracted source file, validated on construction
//!
//! ## Chunks
//! - [`DocumentChunk`]: A token-bounded slice of a document with its identity
//! - [`ChunkMetadata`]: Structural facts about a chunk (index, counts, header, page)
//! - [`ChunkingConfig`]: Token budgets driving the chunking engine
//!
//! ## Retrieval
//! - [`SearchMatch`]: A scored chunk returned by a vector store query
//! - [`StoreStats`]: Vector store statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ValidationError};

// ============================================================================
// Documents
// ============================================================================

/// Source format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// Portable Document Format
    #[serde(rename = ".pdf")]
    Pdf,
    /// Markdown (`.md`, `.markdown`)
    #[serde(rename = ".md")]
    Markdown,
    /// Plain text
    #[serde(rename = ".txt")]
    Text,
}

impl FileType {
    /// All supported file types.
    pub const ALL: [FileType; 3] = [FileType::Pdf, FileType::Markdown, FileType::Text];

    /// Map a file extension (with or without the leading dot) to a file type.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileType::Pdf),
            "md" | "markdown" => Some(FileType::Markdown),
            "txt" => Some(FileType::Text),
            _ => None,
        }
    }

    /// Detect the file type of a path by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical extension, including the leading dot.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => ".pdf",
            FileType::Markdown => ".md",
            FileType::Text => ".txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully-extracted source file.
///
/// Constructed once by the extraction stage and never mutated afterward.
/// Construction rejects whitespace-only content, so the chunking engine can
/// rely on `content` holding text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedDocument {
    file_path: PathBuf,
    file_name: String,
    file_type: FileType,
    title: String,
    content: String,
    token_count: usize,
    char_count: usize,
}

impl ProcessedDocument {
    /// Build a document, validating its fields.
    ///
    /// `char_count` is derived from `content`; `token_count` is supplied by the
    /// caller because it depends on the configured encoder.
    pub fn new(
        file_path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        file_type: FileType,
        title: impl Into<String>,
        content: impl Into<String>,
        token_count: usize,
    ) -> Result<Self, ValidationError> {
        let file_name = file_name.into();
        let title = title.into();
        let content = content.into();

        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if file_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("file_name"));
        }
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }

        let char_count = content.chars().count();
        Ok(Self {
            file_path: file_path.into(),
            file_name,
            file_type,
            title,
            content,
            token_count,
            char_count,
        })
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Token count of the whole content. Informational only.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.char_count
    }
}

// ============================================================================
// Chunks
// ============================================================================

/// One unit of retrievable content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Identifier, unique within the document
    pub id: String,
    /// Chunk text (trimmed, never empty)
    pub content: String,
    /// Structural facts about the chunk
    pub metadata: ChunkMetadata,
}

/// Per-chunk structural facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source file name
    pub file_name: String,
    /// Source file type
    pub file_type: FileType,
    /// Title of the source document
    pub document_title: String,
    /// Position in the document, gapless from 0 across sections and pages
    pub chunk_index: u32,
    /// Exact token count of `content`
    pub token_count: usize,
    /// Character count of `content`
    pub char_count: usize,
    /// Enclosing Markdown header, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_header: Option<String>,
    /// Source page (1-indexed), PDF only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

/// Upper bound accepted for `chunk_size`.
pub const CHUNK_SIZE_LIMIT: usize = 8000;

/// Token budgets for the chunking engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in tokens
    pub chunk_size: usize,
    /// Tokens of trailing context carried into the next chunk
    pub chunk_overlap: usize,
    /// Trailing remainders below this are dropped
    pub min_chunk_size: usize,
    /// Hard ceiling for any chunk
    pub max_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 100,
            max_chunk_size: 2000,
        }
    }
}

impl ChunkingConfig {
    /// Check the budgets for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidChunking(msg));

        if self.chunk_size == 0 {
            return invalid("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_size > CHUNK_SIZE_LIMIT {
            return invalid(format!(
                "chunk_size must be at most {CHUNK_SIZE_LIMIT}, got {}",
                self.chunk_size
            ));
        }
        if self.min_chunk_size == 0 {
            return invalid("min_chunk_size must be greater than 0".to_string());
        }
        if self.max_chunk_size == 0 {
            return invalid("max_chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return invalid(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.min_chunk_size >= self.max_chunk_size {
            return invalid(format!(
                "min_chunk_size ({}) must be less than max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            ));
        }
        if self.chunk_size > self.max_chunk_size {
            return invalid(format!(
                "chunk_size ({}) must not exceed max_chunk_size ({})",
                self.chunk_size, self.max_chunk_size
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Retrieval
// ============================================================================

/// A chunk matched by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Chunk ID
    pub id: String,
    /// Similarity score in `[0, 1]`
    pub score: f32,
    /// Chunk content
    pub content: String,
    /// Flat chunk metadata as stored alongside the vector
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Vector store statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total number of chunks
    pub total_chunks: u64,
    /// Number of distinct source files
    pub total_files: u64,
    /// Last update time
    pub last_updated: Option<DateTime<Utc>>,
}
