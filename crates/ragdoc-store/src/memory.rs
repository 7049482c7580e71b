//! In-memory vector store backed by an injected embedder.
//!
//! [`MemoryStore`] keeps every record in memory and answers queries with
//! brute-force cosine similarity. It is the reference adapter used by the
//! ingestion tests and is adequate for small corpora.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragdoc_core::{DocumentChunk, Embedder, SearchMatch, StoreError, StoreStats, VectorStore};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::record::VectorRecord;

/// Default number of texts sent to the embedder per call.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 100;

struct StoredRecord {
    record: VectorRecord,
    content: String,
    embedding: Vec<f32>,
}

/// In-memory vector store.
///
/// # Example
///
/// ```rust,ignore
/// use ragdoc_store::MemoryStore;
/// use ragdoc_core::VectorStore;
///
/// let store = MemoryStore::new(Arc::new(my_embedder));
/// store.init().await?;
/// store.upsert_chunks(&chunks).await?;
/// let matches = store.query("how do I install it?", 5).await?;
/// ```
pub struct MemoryStore {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    records: RwLock<HashMap<String, StoredRecord>>,
    last_updated: RwLock<Option<DateTime<Utc>>>,
    initialized: RwLock<bool>,
}

impl MemoryStore {
    /// Create a new store that embeds through `embedder`.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            records: RwLock::new(HashMap::new()),
            last_updated: RwLock::new(None),
            initialized: RwLock::new(false),
        }
    }

    /// Set the embedding batch size (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        if *self.initialized.read().await {
            Ok(())
        } else {
            Err(StoreError::Init("store not initialized".to_string()))
        }
    }

    async fn embed_batched(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StoreError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            let vectors = self.embedder.embed_text(batch).await?;
            if vectors.len() != batch.len() {
                return Err(StoreError::Upsert(format!(
                    "embedder returned {} vectors for batch {} of {} texts",
                    vectors.len(),
                    i + 1,
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
        }
        Ok(embeddings)
    }

    async fn touch(&self) {
        *self.last_updated.write().await = Some(Utc::now());
    }
}

/// Cosine similarity clamped to `[0, 1]`; mismatched or zero vectors score 0.
fn similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        *self.initialized.write().await = true;
        debug!(
            "MemoryStore initialized (model: {}, dimension: {})",
            self.embedder.model_name(),
            self.embedder.dimension()
        );
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), StoreError> {
        self.ensure_initialized().await?;
        if chunks.is_empty() {
            return Ok(());
        }

        let records: Vec<VectorRecord> = chunks.iter().map(VectorRecord::from_chunk).collect();
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let embeddings = self.embed_batched(&texts).await?;

        let mut store = self.records.write().await;
        for ((record, embedding), chunk) in records.into_iter().zip(embeddings).zip(chunks) {
            store.insert(
                record.id.clone(),
                StoredRecord {
                    record,
                    content: chunk.content.clone(),
                    embedding,
                },
            );
        }
        drop(store);

        self.touch().await;
        debug!("Upserted {} chunks", chunks.len());
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchMatch>, StoreError> {
        self.ensure_initialized().await?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_query(text).await?;
        let store = self.records.read().await;

        let mut scored: Vec<(f32, &StoredRecord)> = store
            .values()
            .map(|stored| (similarity(&query, &stored.embedding), stored))
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.record.id.cmp(&b.1.record.id))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, stored)| SearchMatch {
                id: stored.record.id.clone(),
                score,
                content: stored.content.clone(),
                metadata: stored.record.metadata.clone(),
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.ensure_initialized().await?;
        let removed = {
            let mut store = self.records.write().await;
            let removed = store.len();
            store.clear();
            removed
        };
        self.touch().await;
        debug!("Deleted {} chunks", removed);
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let store = self.records.read().await;
        let files: HashSet<&str> = store.values().filter_map(|s| s.record.file_name()).collect();

        Ok(StoreStats {
            total_chunks: store.len() as u64,
            total_files: files.len() as u64,
            last_updated: *self.last_updated.read().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdoc_core::{ChunkMetadata, EmbedError, FileType};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    const VOCABULARY: [&str; 4] = ["rust", "python", "cooking", "garden"];

    /// Embeds a text as counts of a few keywords; records the largest batch seen.
    #[derive(Default)]
    struct KeywordEmbedder {
        calls: AtomicUsize,
        largest_batch: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        fn dimension(&self) -> usize {
            VOCABULARY.len()
        }

        async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.largest_batch
                .fetch_max(texts.len(), AtomicOrdering::SeqCst);
            Ok(texts
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    VOCABULARY
                        .iter()
                        .map(|word| lower.matches(word).count() as f32)
                        .collect()
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            4
        }

        async fn embed_text(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Err(EmbedError::Inference("model offline".to_string()))
        }
    }

    fn chunk(id: &str, file_name: &str, content: &str) -> DocumentChunk {
        DocumentChunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                file_name: file_name.to_string(),
                file_type: FileType::Text,
                document_title: "Doc".to_string(),
                chunk_index: 0,
                token_count: 1,
                char_count: content.chars().count(),
                section_header: None,
                page_number: None,
            },
        }
    }

    async fn store_with(chunks: &[DocumentChunk]) -> MemoryStore {
        let store = MemoryStore::new(Arc::new(KeywordEmbedder::default()));
        store.init().await.unwrap();
        store.upsert_chunks(chunks).await.unwrap();
        store
    }

    // ==================== Similarity Tests ====================

    #[test]
    fn test_similarity() {
        assert!((similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        // Opposite vectors clamp to 0
        assert_eq!(similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert_eq!(similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    // ==================== Store Tests ====================

    #[tokio::test]
    async fn test_requires_init() {
        let store = MemoryStore::new(Arc::new(KeywordEmbedder::default()));
        let result = store.upsert_chunks(&[chunk("a_0", "a.txt", "rust")]).await;
        assert!(matches!(result, Err(StoreError::Init(_))));
    }

    #[tokio::test]
    async fn test_upsert_and_stats() {
        let store = store_with(&[
            chunk("a_0", "a.txt", "rust"),
            chunk("a_1", "a.txt", "python"),
            chunk("b_0", "b.txt", "cooking"),
        ])
        .await;

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.total_files, 2);
        assert!(stats.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = store_with(&[chunk("a_0", "a.txt", "rust")]).await;
        store
            .upsert_chunks(&[chunk("a_0", "a.txt", "cooking")])
            .await
            .unwrap();

        assert_eq!(store.stats().await.unwrap().total_chunks, 1);
        let matches = store.query("cooking", 1).await.unwrap();
        assert_eq!(matches[0].content, "cooking");
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let store = store_with(&[
            chunk("a_0", "a.txt", "Rust and more rust"),
            chunk("b_0", "b.txt", "Python snippets"),
            chunk("c_0", "c.txt", "Cooking in the garden"),
        ])
        .await;

        let matches = store.query("rust", 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a_0");
        assert!((matches[0].score - 1.0).abs() < 1e-6);
        assert_eq!(matches[0].metadata["file_name"], "a.txt");
        assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.score)));
    }

    #[tokio::test]
    async fn test_query_ties_broken_by_id() {
        let store = store_with(&[
            chunk("z_0", "z.txt", "garden"),
            chunk("m_0", "m.txt", "garden"),
            chunk("a_0", "a.txt", "garden"),
        ])
        .await;

        let ids: Vec<String> = store
            .query("garden", 3)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["a_0", "m_0", "z_0"]);
    }

    #[tokio::test]
    async fn test_query_top_k_zero() {
        let store = store_with(&[chunk("a_0", "a.txt", "rust")]).await;
        assert!(store.query("rust", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embeds_in_batches() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let store = MemoryStore::new(embedder.clone()).with_batch_size(2);
        store.init().await.unwrap();

        let chunks: Vec<_> = (0..5)
            .map(|i| chunk(&format!("a_{i}"), "a.txt", "rust"))
            .collect();
        store.upsert_chunks(&chunks).await.unwrap();

        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), 3);
        assert_eq!(embedder.largest_batch.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(store.stats().await.unwrap().total_chunks, 5);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = store_with(&[chunk("a_0", "a.txt", "rust")]).await;
        store.delete_all().await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 0);
        assert_eq!(stats.total_files, 0);
        assert!(store.query("rust", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_stores_nothing() {
        let store = MemoryStore::new(Arc::new(FailingEmbedder));
        store.init().await.unwrap();

        let result = store.upsert_chunks(&[chunk("a_0", "a.txt", "rust")]).await;
        assert!(matches!(result, Err(StoreError::Embedding(_))));
        assert_eq!(store.stats().await.unwrap().total_chunks, 0);
    }
}
