//! Turns a file on disk into a [`ProcessedDocument`].

use ragdoc_core::{Error, ExtractError, FileType, ProcessedDocument, Result, TokenEncoder};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::{DocumentTitleExtractor, ExtractorRegistry, TextCleaner};

/// Prepares documents for chunking.
///
/// Processing runs extract → clean → infer title → count tokens and
/// validates the result, so an empty or whitespace-only file is rejected
/// here rather than producing zero chunks later.
pub struct DocumentProcessor {
    registry: ExtractorRegistry,
    cleaner: TextCleaner,
    titles: DocumentTitleExtractor,
    encoder: Arc<dyn TokenEncoder>,
}

impl DocumentProcessor {
    /// Create a processor with the default extractors.
    #[must_use]
    pub fn new(encoder: Arc<dyn TokenEncoder>) -> Self {
        Self::with_registry(ExtractorRegistry::with_defaults(), encoder)
    }

    /// Create a processor with a custom extractor registry.
    #[must_use]
    pub fn with_registry(registry: ExtractorRegistry, encoder: Arc<dyn TokenEncoder>) -> Self {
        Self {
            registry,
            cleaner: TextCleaner::new(),
            titles: DocumentTitleExtractor::new(),
            encoder,
        }
    }

    /// Process a single file.
    pub async fn process_file(&self, path: &Path) -> Result<ProcessedDocument> {
        let file_type = FileType::from_path(path).ok_or_else(|| {
            ExtractError::UnsupportedType(path.display().to_string())
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Other(format!("Invalid file name: {}", path.display())))?;

        let raw = self.registry.extract(path).await?;
        let content = self.cleaner.clean(&raw);
        let title = self.titles.extract_title(path, file_type, &content);
        let token_count = self.encoder.count_tokens(&content);

        debug!(
            "Processed {} ({}): {} tokens, title {:?}",
            file_name, file_type, token_count, title
        );

        Ok(ProcessedDocument::new(
            path,
            file_name,
            file_type,
            title,
            content,
            token_count,
        )?)
    }
}
