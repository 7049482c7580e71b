//! Structure-aware document chunking for ragdoc.
//!
//! [`DocumentChunker`] turns a [`ragdoc_core::ProcessedDocument`] into ordered,
//! token-bounded chunks. Markdown is chunked by section, PDF text by page and
//! plain text as a whole, all sharing one paragraph/sentence packing algorithm
//! driven by a [`TiktokenEncoder`].

pub mod engine;
mod markdown;
pub mod pdf;
pub mod splitter;
pub mod strategy;
pub mod tokenizer;

pub use engine::{chunk_id, sanitize_header, ChunkAnchor, ChunkCursor, DocumentChunker};
pub use pdf::{split_pages, PageText, PAGE_MARKER};
pub use splitter::{
    MarkdownSection, MarkdownSectionSplitter, ParagraphSplitter, SentenceSplitter, TextSplitter,
};
pub use strategy::ChunkingStrategy;
pub use tokenizer::{TiktokenEncoder, DEFAULT_ENCODING, SUPPORTED_ENCODINGS};
