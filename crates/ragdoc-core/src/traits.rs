//! Core traits for ragdoc components.
//!
//! This module defines the trait interfaces at each seam of the pipeline:
//!
//! - [`TokenEncoder`]: Reversible text/token mapping used for every size decision
//! - [`TextChunker`]: Turn a processed document into ordered chunks
//! - [`ContentExtractor`]: Produce plain text from a source file
//! - [`Embedder`]: Generate vector embeddings (external models)
//! - [`VectorStore`]: Receive finished chunks and answer similarity queries
//!
//! Chunking and token encoding are synchronous pure computations; the
//! collaborators that do I/O are async.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{ChunkError, EmbedError, ExtractError, StoreError};
use crate::types::{DocumentChunk, FileType, ProcessedDocument, SearchMatch, StoreStats};

// ============================================================================
// Token Encoding
// ============================================================================

/// Deterministic, reversible mapping between text and token ids.
///
/// Implementations must be safe for concurrent read-only use and must return
/// the same tokens for the same text every time.
pub trait TokenEncoder: Send + Sync {
    /// Name of the vocabulary (e.g. `cl100k_base`).
    fn name(&self) -> &str;

    /// Encode text into token ids, preserving order.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids back into text.
    fn decode(&self, tokens: &[u32]) -> Result<String, ChunkError>;

    /// Number of tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

// ============================================================================
// Chunking
// ============================================================================

/// Trait for splitting a processed document into chunks.
pub trait TextChunker: Send + Sync {
    /// Chunk one document.
    ///
    /// Either returns the complete ordered chunk list or fails as a whole;
    /// partial output is never returned.
    fn chunk_document(&self, document: &ProcessedDocument)
        -> Result<Vec<DocumentChunk>, ChunkError>;
}

// ============================================================================
// Content Extraction
// ============================================================================

/// Trait for extracting plain text from files.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// File types this extractor can handle.
    fn supported_types(&self) -> &[FileType];

    /// Check if this extractor can handle the given file.
    fn can_extract(&self, path: &Path) -> bool {
        FileType::from_path(path).is_some_and(|ft| self.supported_types().contains(&ft))
    }

    /// Extract the raw text of a file.
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single query.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let results = self.embed_text(&[query]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Narrow contract for the vector store the chunks are handed to.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the store.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert or replace chunks by id.
    async fn upsert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), StoreError>;

    /// Return the `top_k` chunks most similar to `text`.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchMatch>, StoreError>;

    /// Remove every stored chunk.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Get store statistics.
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
