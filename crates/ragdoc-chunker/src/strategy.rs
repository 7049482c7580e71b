//! Per-file-type chunking strategies.

use ragdoc_core::{ChunkError, FileType, ProcessedDocument};

use crate::engine::{ChunkAnchor, ChunkCursor, DocumentChunker};
use crate::{markdown, pdf};

/// Chunking strategy, selected once per document from its file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    /// Section-aware: whole sections when they fit, tagged with their header
    Markdown,
    /// Page-aware: never crosses a page marker, tagged with the page number
    Pdf,
    /// Paragraph and sentence packing over the whole content
    Text,
}

impl ChunkingStrategy {
    #[must_use]
    pub fn for_file_type(file_type: FileType) -> Self {
        match file_type {
            FileType::Markdown => ChunkingStrategy::Markdown,
            FileType::Pdf => ChunkingStrategy::Pdf,
            FileType::Text => ChunkingStrategy::Text,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ChunkingStrategy::Markdown => "markdown",
            ChunkingStrategy::Pdf => "pdf",
            ChunkingStrategy::Text => "text",
        }
    }

    pub(crate) fn chunk(
        &self,
        chunker: &DocumentChunker,
        document: &ProcessedDocument,
        cursor: &mut ChunkCursor,
    ) -> Result<(), ChunkError> {
        match self {
            ChunkingStrategy::Markdown => markdown::chunk_sections(chunker, document, cursor),
            ChunkingStrategy::Pdf => pdf::chunk_pages(chunker, document, cursor),
            ChunkingStrategy::Text => {
                chunker.chunk_text(document, document.content(), ChunkAnchor::Document, cursor)
            }
        }
    }
}
