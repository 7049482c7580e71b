//! Error types for ragdoc.

use thiserror::Error;

/// Main error type for ragdoc operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration was rejected
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A data-model value failed validation
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Content extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Configuration errors. Fatal: nothing is chunked once one of these is raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid chunking configuration: {0}")]
    InvalidChunking(String),

    #[error("token encoder unavailable: {0}")]
    Encoder(String),

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}

/// Data-model validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document content cannot be empty")]
    EmptyContent,

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}

/// Content extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Chunking of one document failed; its partial output was discarded.
    #[error("failed to chunk document {file_name}: {source}")]
    Document {
        file_name: String,
        #[source]
        source: Box<ChunkError>,
    },

    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error("chunking failed: {0}")]
    Failed(String),
}

impl ChunkError {
    /// Wrap an error with the file name of the document being chunked.
    pub fn for_document(file_name: impl Into<String>, source: ChunkError) -> Self {
        match source {
            already @ ChunkError::Document { .. } => already,
            other => ChunkError::Document {
                file_name: file_name.into(),
                source: Box::new(other),
            },
        }
    }

    /// File name of the failed document, if known.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ChunkError::Document { file_name, .. } => Some(file_name),
            _ => None,
        }
    }
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("input too long: {tokens} tokens, max {max}")]
    InputTooLong { tokens: usize, max: usize },
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("upsert failed: {0}")]
    Upsert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),
}

/// Result type alias for ragdoc operations.
pub type Result<T> = std::result::Result<T, Error>;
