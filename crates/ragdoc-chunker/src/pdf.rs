//! PDF chunking: pages are chunked independently and tagged with their number.
//!
//! Extracted PDF text carries `--- Page N ---` markers (see `ragdoc-extract`).
//! Chunks never span two pages.

use ragdoc_core::{ChunkError, ProcessedDocument};

use crate::engine::{ChunkAnchor, ChunkCursor, DocumentChunker};

/// Prefix of the marker that opens each page.
pub const PAGE_MARKER: &str = "--- Page ";

/// Text of one page, marker included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Page number, 1-indexed
    pub number: u32,
    /// Page text, starting with its marker when it had one
    pub text: String,
}

/// Split PDF text into pages at each [`PAGE_MARKER`].
///
/// Text before the first marker is page 1. Blank fragments are skipped.
/// The page number is read from the marker; a marker without a readable
/// number falls back to the fragment's position.
#[must_use]
pub fn split_pages(content: &str) -> Vec<PageText> {
    content
        .split(PAGE_MARKER)
        .enumerate()
        .filter(|(_, fragment)| !fragment.trim().is_empty())
        .map(|(i, fragment)| {
            if i == 0 {
                return PageText {
                    number: 1,
                    text: fragment.to_string(),
                };
            }
            let ordinal = u32::try_from(i).unwrap_or(u32::MAX);
            PageText {
                number: marker_page_number(fragment).unwrap_or(ordinal),
                text: format!("{PAGE_MARKER}{fragment}"),
            }
        })
        .collect()
}

/// Parse the `N` out of the `N ---` remainder of a marker.
fn marker_page_number(fragment: &str) -> Option<u32> {
    let (number, _) = fragment.split_once("---")?;
    number.trim().parse().ok().filter(|&n| n >= 1)
}

pub(crate) fn chunk_pages(
    chunker: &DocumentChunker,
    document: &ProcessedDocument,
    cursor: &mut ChunkCursor,
) -> Result<(), ChunkError> {
    for page in split_pages(document.content()) {
        chunker.chunk_text(document, &page.text, ChunkAnchor::Page(page.number), cursor)?;
    }
    Ok(())
}
