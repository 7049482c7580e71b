//! Vector store adapters for ragdoc.
//!
//! This crate implements the [`VectorStore`](ragdoc_core::VectorStore)
//! contract for the chunks produced by `ragdoc-chunker`.
//!
//! # Adapters
//!
//! - [`MemoryStore`]: in-memory store that embeds through an injected
//!   [`Embedder`](ragdoc_core::Embedder) and answers similarity queries
//! - [`JsonlStore`]: export adapter appending records to a JSON Lines file
//!
//! Both store [`VectorRecord`]s: the chunk ID, the whitespace-normalized
//! text, and flat metadata with null fields removed plus a
//! `content_preview` of at most 500 characters.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdoc_core::VectorStore;
//! use ragdoc_store::JsonlStore;
//!
//! let store = JsonlStore::new("chunks.jsonl");
//! store.init().await?;
//! store.upsert_chunks(&chunks).await?;
//! ```

pub mod export;
pub mod memory;
pub mod record;

pub use export::JsonlStore;
pub use memory::{MemoryStore, DEFAULT_EMBED_BATCH_SIZE};
pub use record::{normalize_whitespace, VectorRecord, PREVIEW_CHARS, PREVIEW_KEY};
