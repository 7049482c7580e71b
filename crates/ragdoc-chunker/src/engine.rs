//! The document chunking engine.
//!
//! [`DocumentChunker`] selects a [`ChunkingStrategy`] per document and fills
//! token budgets with paragraphs, falling back to sentences and then to raw
//! token windows for oversized units. Chunk indices are threaded through a
//! [`ChunkCursor`] owned by a single `chunk_document` call, so one chunker can
//! be shared across threads.

use std::sync::Arc;

use ragdoc_core::{
    ChunkError, ChunkMetadata, ChunkingConfig, ConfigError, DocumentChunk, ProcessedDocument,
    TextChunker, TokenEncoder,
};
use tracing::debug;

use crate::splitter::{ParagraphSplitter, SentenceSplitter, TextSplitter};
use crate::strategy::ChunkingStrategy;
use crate::tokenizer::{tail_text, token_windows, TiktokenEncoder};

/// Separator placed between fragments of one chunk.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Maximum length, in characters, of the header slug inside a chunk ID.
pub const HEADER_SLUG_LEN: usize = 50;

/// Where a run of chunks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkAnchor<'a> {
    /// No structural anchor (plain text)
    Document,
    /// Inside a Markdown section with this header
    Section(&'a str),
    /// On this PDF page (1-indexed)
    Page(u32),
}

impl<'a> ChunkAnchor<'a> {
    fn section_header(self) -> Option<&'a str> {
        match self {
            ChunkAnchor::Section(header) => Some(header),
            _ => None,
        }
    }

    fn page_number(self) -> Option<u32> {
        match self {
            ChunkAnchor::Page(page) => Some(page),
            _ => None,
        }
    }
}

/// Output of one `chunk_document` call under construction.
#[derive(Debug, Default)]
pub struct ChunkCursor {
    next_index: u32,
    chunks: Vec<DocumentChunk>,
}

impl ChunkCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next emitted chunk will receive.
    #[must_use]
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Number of chunks emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn push(&mut self, chunk: DocumentChunk) {
        self.chunks.push(chunk);
        self.next_index += 1;
    }

    fn into_chunks(self) -> Vec<DocumentChunk> {
        self.chunks
    }
}

/// Structure-aware, token-budgeted document chunker.
pub struct DocumentChunker {
    config: ChunkingConfig,
    encoder: Arc<dyn TokenEncoder>,
    paragraphs: ParagraphSplitter,
    sentences: SentenceSplitter,
}

impl DocumentChunker {
    /// Create a chunker, validating the configuration.
    pub fn new(config: ChunkingConfig, encoder: Arc<dyn TokenEncoder>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder,
            paragraphs: ParagraphSplitter,
            sentences: SentenceSplitter,
        })
    }

    /// Create a chunker backed by the `cl100k_base` encoding.
    pub fn with_default_encoder(config: ChunkingConfig) -> Result<Self, ConfigError> {
        let encoder = TiktokenEncoder::cl100k()?;
        Self::new(config, Arc::new(encoder))
    }

    #[must_use]
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    #[must_use]
    pub fn encoder(&self) -> &dyn TokenEncoder {
        self.encoder.as_ref()
    }

    /// Chunk one document with the strategy for its file type.
    ///
    /// Fails as a whole with [`ChunkError::Document`]; no partial output is
    /// returned.
    pub fn chunk_document(
        &self,
        document: &ProcessedDocument,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        let strategy = ChunkingStrategy::for_file_type(document.file_type());
        let mut cursor = ChunkCursor::new();

        strategy
            .chunk(self, document, &mut cursor)
            .map_err(|e| ChunkError::for_document(document.file_name(), e))?;

        debug!(
            "Chunked {} with {} strategy into {} chunks",
            document.file_name(),
            strategy.name(),
            cursor.len()
        );
        Ok(cursor.into_chunks())
    }

    /// Fill token budgets from `text` and emit the resulting chunks.
    ///
    /// One call is one run: a trailing remainder below `min_chunk_size` is
    /// dropped only when the run has already emitted a chunk.
    pub(crate) fn chunk_text(
        &self,
        document: &ProcessedDocument,
        text: &str,
        anchor: ChunkAnchor<'_>,
        cursor: &mut ChunkCursor,
    ) -> Result<(), ChunkError> {
        let mut run = Accumulator::default();

        for paragraph in self.paragraphs.split(text) {
            if self.encoder.count_tokens(&paragraph) <= self.config.max_chunk_size {
                self.add_fragment(document, paragraph, anchor, &mut run, cursor)?;
                continue;
            }

            for sentence in self.sentences.split(&paragraph) {
                if self.encoder.count_tokens(&sentence) <= self.config.max_chunk_size {
                    self.add_fragment(document, sentence, anchor, &mut run, cursor)?;
                    continue;
                }
                let pieces =
                    token_windows(self.encoder.as_ref(), &sentence, self.config.chunk_size)?;
                for piece in pieces {
                    self.add_fragment(document, piece, anchor, &mut run, cursor)?;
                }
            }
        }

        if run.fragments.is_empty() {
            return Ok(());
        }
        let remainder = run.joined();
        let tokens = self.encoder.count_tokens(remainder.trim());
        if tokens >= self.config.min_chunk_size || run.emitted == 0 {
            self.emit(document, &remainder, anchor, cursor);
        } else {
            debug!(
                "Dropping {}-token trailing remainder of {} (minimum {})",
                tokens,
                document.file_name(),
                self.config.min_chunk_size
            );
        }
        Ok(())
    }

    fn add_fragment(
        &self,
        document: &ProcessedDocument,
        fragment: String,
        anchor: ChunkAnchor<'_>,
        run: &mut Accumulator,
        cursor: &mut ChunkCursor,
    ) -> Result<(), ChunkError> {
        if !run.fragments.is_empty() {
            let candidate = format!("{}{FRAGMENT_SEPARATOR}{fragment}", run.joined());
            if self.encoder.count_tokens(&candidate) > self.config.chunk_size {
                let closed = run.joined();
                if self.emit(document, &closed, anchor, cursor) {
                    run.emitted += 1;
                }
                run.fragments.clear();
                if let Some(seed) = self.overlap_seed(&closed, &fragment)? {
                    run.fragments.push(seed);
                }
            }
        }
        run.fragments.push(fragment);
        Ok(())
    }

    /// Trailing context of `closed` to carry into the next chunk.
    ///
    /// Starts from the last `chunk_overlap` tokens and shrinks until the seed
    /// plus `fragment` fits `max_chunk_size`.
    fn overlap_seed(&self, closed: &str, fragment: &str) -> Result<Option<String>, ChunkError> {
        let mut budget = self.config.chunk_overlap;
        while budget > 0 {
            let tail = tail_text(self.encoder.as_ref(), closed, budget)?;
            let tail = tail.trim();
            if tail.is_empty() {
                return Ok(None);
            }
            let total = self
                .encoder
                .count_tokens(&format!("{tail}{FRAGMENT_SEPARATOR}{fragment}"));
            if total <= self.config.max_chunk_size {
                return Ok(Some(tail.to_string()));
            }
            budget = budget.saturating_sub(total - self.config.max_chunk_size);
        }
        Ok(None)
    }

    /// Build and record one chunk. Returns `false` if `text` has no tokens.
    pub(crate) fn emit(
        &self,
        document: &ProcessedDocument,
        text: &str,
        anchor: ChunkAnchor<'_>,
        cursor: &mut ChunkCursor,
    ) -> bool {
        let content = text.trim();
        let token_count = self.encoder.count_tokens(content);
        if token_count == 0 {
            return false;
        }

        let chunk_index = cursor.next_index();
        let section_header = anchor.section_header();
        let chunk = DocumentChunk {
            id: chunk_id(document.file_name(), section_header, chunk_index),
            content: content.to_string(),
            metadata: ChunkMetadata {
                file_name: document.file_name().to_string(),
                file_type: document.file_type(),
                document_title: document.title().to_string(),
                chunk_index,
                token_count,
                char_count: content.chars().count(),
                section_header: section_header.map(str::to_string),
                page_number: anchor.page_number(),
            },
        };
        cursor.push(chunk);
        true
    }
}

impl std::fmt::Debug for DocumentChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentChunker")
            .field("config", &self.config)
            .field("encoder", &self.encoder.name())
            .finish()
    }
}

impl TextChunker for DocumentChunker {
    fn chunk_document(
        &self,
        document: &ProcessedDocument,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        DocumentChunker::chunk_document(self, document)
    }
}

/// Fragments of the chunk being filled within one run.
#[derive(Debug, Default)]
struct Accumulator {
    fragments: Vec<String>,
    emitted: usize,
}

impl Accumulator {
    fn joined(&self) -> String {
        self.fragments.join(FRAGMENT_SEPARATOR)
    }
}

/// Reduce a section header to an ID-safe slug.
///
/// Keeps letters, digits, `_`, `-` and whitespace, turns whitespace runs into
/// single underscores and truncates to [`HEADER_SLUG_LEN`] characters.
#[must_use]
pub fn sanitize_header(header: &str) -> String {
    let kept: String = header
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(HEADER_SLUG_LEN)
        .collect()
}

/// `{file}_{index}`, or `{file}_{slug}_{index}` inside a named section.
#[must_use]
pub fn chunk_id(file_name: &str, section_header: Option<&str>, chunk_index: u32) -> String {
    match section_header.map(sanitize_header) {
        Some(slug) if !slug.is_empty() => format!("{file_name}_{slug}_{chunk_index}"),
        _ => format!("{file_name}_{chunk_index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdoc_core::FileType;

    fn chunker(chunk_size: usize, overlap: usize, min: usize, max: usize) -> DocumentChunker {
        DocumentChunker::with_default_encoder(ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
            min_chunk_size: min,
            max_chunk_size: max,
        })
        .unwrap()
    }

    fn text_doc(content: &str) -> ProcessedDocument {
        ProcessedDocument::new("/docs/a.txt", "a.txt", FileType::Text, "A", content, 0).unwrap()
    }

    fn run(chunker: &DocumentChunker, doc: &ProcessedDocument) -> Vec<DocumentChunk> {
        let mut cursor = ChunkCursor::new();
        chunker
            .chunk_text(doc, doc.content(), ChunkAnchor::Document, &mut cursor)
            .unwrap();
        cursor.into_chunks()
    }

    // ==================== Identity Tests ====================

    #[test]
    fn test_sanitize_header_strips_punctuation() {
        assert_eq!(sanitize_header("Getting Started!"), "Getting_Started");
        assert_eq!(sanitize_header("  API: v2 (beta)  "), "API_v2_beta");
        assert_eq!(sanitize_header("snake_case-and-kebab"), "snake_case-and-kebab");
    }

    #[test]
    fn test_sanitize_header_keeps_unicode_letters() {
        assert_eq!(sanitize_header("Über  die Welt"), "Über_die_Welt");
        assert_eq!(sanitize_header("日本語 見出し"), "日本語_見出し");
    }

    #[test]
    fn test_sanitize_header_truncates() {
        let slug = sanitize_header(&"a".repeat(80));
        assert_eq!(slug.chars().count(), HEADER_SLUG_LEN);
    }

    #[test]
    fn test_chunk_id_forms() {
        assert_eq!(chunk_id("a.md", None, 0), "a.md_0");
        assert_eq!(chunk_id("a.md", Some("Intro"), 4), "a.md_Intro_4");
        assert_eq!(chunk_id("a.md", Some("!!!"), 2), "a.md_2");
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = DocumentChunker::with_default_encoder(ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 150,
            min_chunk_size: 10,
            max_chunk_size: 200,
        });
        assert!(matches!(result, Err(ConfigError::InvalidChunking(_))));
    }

    // ==================== Generic Algorithm Tests ====================

    #[test]
    fn test_single_small_paragraph_bypasses_minimum() {
        let chunker = chunker(100, 10, 50, 200);
        let chunks = run(&chunker, &text_doc("Tiny."));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Tiny.");
        assert_eq!(chunks[0].id, "a.txt_0");
    }

    #[test]
    fn test_paragraphs_packed_into_budget() {
        let chunker = chunker(50, 0, 1, 100);
        let paragraph = "alpha beta gamma delta epsilon zeta eta theta";
        let text = vec![paragraph; 12].join("\n\n");
        let chunks = run(&chunker, &text_doc(&text));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.metadata.token_count <= 50);
            assert!(chunk.content.starts_with("alpha"));
            assert!(chunk.content.ends_with("theta"));
        }
    }

    #[test]
    fn test_overlap_seeds_next_chunk() {
        let chunker = chunker(40, 5, 1, 80);
        let paragraphs: Vec<String> = (0..10)
            .map(|i| format!("Paragraph {i} talks about topic number {i} in detail."))
            .collect();
        let chunks = run(&chunker, &text_doc(&paragraphs.join("\n\n")));

        assert!(chunks.len() > 1);
        let enc = chunker.encoder();
        for pair in chunks.windows(2) {
            let tail = tail_text(enc, &pair[0].content, 5).unwrap();
            assert!(
                pair[1].content.starts_with(tail.trim()),
                "{:?} should start with {:?}",
                pair[1].content,
                tail.trim()
            );
        }
    }

    #[test]
    fn test_trailing_remainder_below_minimum_dropped() {
        let chunker = chunker(30, 0, 10, 60);
        let long = "one two three four five six seven eight nine ten eleven twelve";
        let text = format!("{long} {long} {long}\n\nEnd.");
        let chunks = run(&chunker, &text_doc(&text));

        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].content.contains("End."));
    }

    #[test]
    fn test_oversized_sentence_split_into_windows() {
        let chunker = chunker(20, 0, 1, 40);
        let text = "word ".repeat(200);
        let chunks = run(&chunker, &text_doc(&text));

        assert!(chunks.len() >= 5);
        for chunk in &chunks {
            assert!(chunk.metadata.token_count <= 40);
        }
    }

    #[test]
    fn test_overlap_never_breaks_ceiling() {
        let chunker = chunker(50, 40, 1, 60);
        let sentence = "This sentence is moderately long and keeps going for a while.";
        let text = vec![sentence; 30].join(" ");
        let chunks = run(&chunker, &text_doc(&text));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunker.encoder().count_tokens(&chunk.content) <= 60);
        }
    }

    #[test]
    fn test_metadata_counts_match_content() {
        let chunker = chunker(100, 10, 1, 200);
        let chunks = run(&chunker, &text_doc("  Héllo wörld.  \n\n Second paragraph. "));
        for chunk in &chunks {
            assert_eq!(chunk.content, chunk.content.trim());
            assert_eq!(chunk.metadata.char_count, chunk.content.chars().count());
            assert_eq!(
                chunk.metadata.token_count,
                chunker.encoder().count_tokens(&chunk.content)
            );
        }
    }

    #[test]
    fn test_cursor_index_continues_across_runs() {
        let chunker = chunker(100, 10, 1, 200);
        let doc = text_doc("first");
        let mut cursor = ChunkCursor::new();
        chunker
            .chunk_text(&doc, "first run", ChunkAnchor::Section("One"), &mut cursor)
            .unwrap();
        chunker
            .chunk_text(&doc, "second run", ChunkAnchor::Page(3), &mut cursor)
            .unwrap();

        let chunks = cursor.into_chunks();
        assert_eq!(chunks[0].id, "a.txt_One_0");
        assert_eq!(chunks[0].metadata.section_header.as_deref(), Some("One"));
        assert_eq!(chunks[1].id, "a.txt_1");
        assert_eq!(chunks[1].metadata.page_number, Some(3));
        assert_eq!(chunks[1].metadata.section_header, None);
    }

    #[test]
    fn test_whitespace_only_text_emits_nothing() {
        let chunker = chunker(100, 10, 1, 200);
        let doc = text_doc("x");
        let mut cursor = ChunkCursor::new();
        chunker
            .chunk_text(&doc, " \n\n \t", ChunkAnchor::Document, &mut cursor)
            .unwrap();
        assert!(cursor.is_empty());
        assert_eq!(cursor.next_index(), 0);
    }
}
