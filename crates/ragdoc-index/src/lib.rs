//! Batch ingestion driver for ragdoc.
//!
//! [`Ingester`] walks a corpus directory, turns each supported file into a
//! processed document, chunks it and hands the chunks to a
//! [`VectorStore`](ragdoc_core::VectorStore) in batches.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdoc_index::{IngestConfig, Ingester, IngestUpdate};
//!
//! let ingester = Ingester::new(processor, chunker, store, IngestConfig::default());
//! let mut updates = ingester.subscribe();
//!
//! let report = ingester.run(Path::new("./docs")).await?;
//! println!("{} chunks, {} failures", report.total_chunks, report.failed());
//! ```

pub mod ingester;

pub use ingester::{
    DocumentOutcome, DocumentStatus, IngestConfig, IngestReport, IngestUpdate, Ingester,
};
