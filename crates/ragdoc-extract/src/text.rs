//! Text content extractor for Markdown and plain text files.

use async_trait::async_trait;
use ragdoc_core::{ContentExtractor, ExtractError, FileType};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Extractor for Markdown and plain text files.
///
/// Files are read as UTF-8. Files that are not valid UTF-8 are decoded as
/// Latin-1, which never fails.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn supported_types(&self) -> &[FileType] {
        &[FileType::Markdown, FileType::Text]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path).await?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!("{:?} is not valid UTF-8, decoding as Latin-1", path);
                Ok(decode_latin1(e.as_bytes()))
            }
        }
    }
}

/// Decode bytes as ISO-8859-1: every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
