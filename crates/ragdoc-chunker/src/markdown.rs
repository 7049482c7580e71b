//! Markdown chunking: one chunk per section when it fits the budget.

use ragdoc_core::{ChunkError, ProcessedDocument};

use crate::engine::{ChunkAnchor, ChunkCursor, DocumentChunker};
use crate::splitter::{MarkdownSectionSplitter, TextSplitter};

pub(crate) fn chunk_sections(
    chunker: &DocumentChunker,
    document: &ProcessedDocument,
    cursor: &mut ChunkCursor,
) -> Result<(), ChunkError> {
    for section in MarkdownSectionSplitter.split(document.content()) {
        let anchor = section
            .heading()
            .map_or(ChunkAnchor::Document, ChunkAnchor::Section);

        let tokens = chunker.encoder().count_tokens(&section.content);
        if tokens <= chunker.config().chunk_size {
            chunker.emit(document, &section.content, anchor, cursor);
        } else {
            chunker.chunk_text(document, &section.content, anchor, cursor)?;
        }
    }
    Ok(())
}
