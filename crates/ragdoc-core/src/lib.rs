//! # ragdoc-core
//!
//! Core types and traits for ragdoc, a structure-aware document chunker for
//! retrieval-augmented generation.
//!
//! This crate provides the foundational abstractions used throughout ragdoc:
//!
//! - **Token Encoding**: [`TokenEncoder`] trait for exact, repeatable token counts
//! - **Document Chunking**: [`TextChunker`] trait for turning documents into chunks
//! - **Content Extraction**: [`ContentExtractor`] trait for reading text from files
//! - **Embedding Generation**: [`Embedder`] trait for external embedding models
//! - **Vector Storage**: [`VectorStore`] trait for storing and querying chunks
//!
//! ## Architecture
//!
//! ```text
//! File → ContentExtractor → ProcessedDocument → TextChunker → VectorStore
//!                                                                  ↓
//!                                                     query(text, k) → SearchMatch
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProcessedDocument`] | One extracted source file with title and counts |
//! | [`DocumentChunk`] | A token-bounded slice of a document |
//! | [`ChunkMetadata`] | Index, counts, section header or page number |
//! | [`ChunkingConfig`] | Target, overlap, minimum and maximum token budgets |
//! | [`SearchMatch`] | A scored chunk returned by a store query |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`TokenEncoder`] | Encode, decode and count tokens |
//! | [`TextChunker`] | Chunk a processed document |
//! | [`ContentExtractor`] | Extract plain text from files |
//! | [`Embedder`] | Generate vector embeddings |
//! | [`VectorStore`] | Upsert chunks and answer similarity queries |
//!
//! ## Related Crates
//!
//! - `ragdoc-chunker`: Token encoder, structural splitters and the chunking engine
//! - `ragdoc-extract`: Content extraction, cleaning and title detection
//! - `ragdoc-store`: Vector store adapters
//! - `ragdoc-index`: Batch ingestion driver

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ChunkError, ConfigError, EmbedError, Error, ExtractError, Result, StoreError, ValidationError,
};
pub use traits::*;
pub use types::*;
