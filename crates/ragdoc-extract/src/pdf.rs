//! PDF content extractor.
//!
//! Uses lopdf to extract text page by page. Each page with text is prefixed
//! with a `--- Page N ---` marker so downstream chunking can keep page
//! boundaries.

use async_trait::async_trait;
use lopdf::Document;
use ragdoc_core::{ContentExtractor, ExtractError, FileType};
use std::path::Path;
use tracing::{debug, warn};

/// Extractor for PDF files.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    fn supported_types(&self) -> &[FileType] {
        &[FileType::Pdf]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        debug!("Extracting PDF: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        // lopdf parsing is blocking
        tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))?
    }
}

/// Format one page of text with its marker.
#[must_use]
pub fn page_section(page_num: u32, text: &str) -> String {
    format!("--- Page {page_num} ---\n{text}")
}

/// Extract per-page text from PDF bytes, joined with blank lines.
fn extract_pages(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::Parse(format!("Failed to load PDF: {e}")))?;

    let pages = doc.get_pages();
    let mut sections = Vec::with_capacity(pages.len());

    for page_num in pages.keys().copied() {
        match doc.extract_text(&[page_num]) {
            Ok(text) if text.trim().is_empty() => {
                debug!("Skipping page {} without text", page_num);
            }
            Ok(text) => sections.push(page_section(page_num, &text)),
            Err(e) => {
                warn!("Failed to extract text from page {}: {}", page_num, e);
            }
        }
    }

    debug!(
        "Extracted text from {} of {} PDF pages",
        sections.len(),
        pages.len()
    );
    Ok(sections.join("\n\n"))
}
