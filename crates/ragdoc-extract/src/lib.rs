//! # ragdoc-extract
//!
//! Content extraction and document preparation for ragdoc.
//!
//! This crate reads files from disk and produces the
//! [`ProcessedDocument`](ragdoc_core::ProcessedDocument)s consumed by the
//! chunking engine.
//!
//! ## Supported Formats
//!
//! | Extractor | Formats | Notes |
//! |-----------|---------|-------|
//! | [`TextExtractor`] | `.md`, `.markdown`, `.txt` | UTF-8 with Latin-1 fallback |
//! | [`PdfExtractor`] | `.pdf` | Per-page text with `--- Page N ---` markers |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ragdoc_chunker::TiktokenEncoder;
//! use ragdoc_extract::DocumentProcessor;
//! use std::{path::Path, sync::Arc};
//!
//! let processor = DocumentProcessor::new(Arc::new(TiktokenEncoder::cl100k()?));
//! let doc = processor.process_file(Path::new("docs/guide.md")).await?;
//! println!("{}: {} tokens", doc.title(), doc.token_count());
//! ```
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ExtractorRegistry`] | Routes files to extractors by [`FileType`](ragdoc_core::FileType) |
//! | [`TextCleaner`] | Whitespace normalization |
//! | [`DocumentTitleExtractor`] | Title heuristics per file type |
//! | [`DocumentProcessor`] | Path → validated `ProcessedDocument` |

pub mod clean;
pub mod pdf;
pub mod processor;
pub mod registry;
pub mod text;
pub mod title;

pub use clean::TextCleaner;
pub use pdf::PdfExtractor;
pub use processor::DocumentProcessor;
pub use registry::ExtractorRegistry;
pub use text::TextExtractor;
pub use title::{filename_to_title, DocumentTitleExtractor};
