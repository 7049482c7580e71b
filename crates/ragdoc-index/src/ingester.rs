//! Batch ingestion: corpus → processed documents → chunks → vector store.

use futures::stream::{self, StreamExt};
use ragdoc_core::{DocumentChunk, Error, FileType, Result, TextChunker, VectorStore};
use ragdoc_extract::DocumentProcessor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Ingestion progress events.
#[derive(Debug, Clone)]
pub enum IngestUpdate {
    RunStarted { corpus: PathBuf, documents: usize },
    DocumentStarted { path: PathBuf },
    DocumentChunked { path: PathBuf, chunk_count: usize },
    DocumentFailed { path: PathBuf, error: String },
    BatchUpserted { chunk_count: usize },
    RunCompleted { total_chunks: usize, failed: usize },
}

/// Configuration for an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Documents processed at the same time
    pub concurrency: usize,
    /// Time budget for processing and chunking one document. Extraction is
    /// cancelled at the deadline; chunking already running on the blocking
    /// pool runs to completion and its result is discarded.
    pub document_timeout: Duration,
    /// Chunks per `upsert_chunks` call
    pub upsert_batch_size: usize,
    /// Empty the store before ingesting
    pub clean: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            document_timeout: Duration::from_secs(120),
            upsert_batch_size: 100,
            clean: false,
        }
    }
}

/// Result of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Chunked { chunk_count: usize },
    Failed { error: String },
}

/// Outcome of one discovered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub corpus: PathBuf,
    /// One entry per discovered document, in discovery order
    pub documents: Vec<DocumentOutcome>,
    pub total_chunks: usize,
    pub elapsed_ms: u64,
}

impl IngestReport {
    /// Number of documents that produced chunks.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.status, DocumentStatus::Chunked { .. }))
            .count()
    }

    /// Number of documents that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }
}

/// Drives a whole corpus through processing, chunking and storage.
pub struct Ingester {
    processor: Arc<DocumentProcessor>,
    chunker: Arc<dyn TextChunker>,
    store: Arc<dyn VectorStore>,
    config: IngestConfig,
    update_tx: broadcast::Sender<IngestUpdate>,
}

impl Ingester {
    /// Create a new ingester.
    pub fn new(
        processor: Arc<DocumentProcessor>,
        chunker: Arc<dyn TextChunker>,
        store: Arc<dyn VectorStore>,
        config: IngestConfig,
    ) -> Self {
        let (update_tx, _) = broadcast::channel(256);
        Self {
            processor,
            chunker,
            store,
            config,
            update_tx,
        }
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<IngestUpdate> {
        self.update_tx.subscribe()
    }

    /// Find every supported document under `corpus`, sorted by path.
    ///
    /// Hidden files and directories are skipped. A corpus that is itself a
    /// supported file yields just that file.
    pub async fn discover(corpus: &Path) -> Result<Vec<PathBuf>> {
        let root = corpus.to_path_buf();
        tokio::task::spawn_blocking(move || discover_blocking(&root))
            .await
            .map_err(|e| Error::Other(format!("discovery task failed: {e}")))?
    }

    /// Ingest every document under `corpus`.
    ///
    /// Document failures are recorded in the report and never stop the
    /// run; store failures abort it.
    pub async fn run(&self, corpus: &Path) -> Result<IngestReport> {
        let started = Instant::now();
        let paths = Self::discover(corpus).await?;
        info!("Ingesting {} documents from {:?}", paths.len(), corpus);
        let _ = self.update_tx.send(IngestUpdate::RunStarted {
            corpus: corpus.to_path_buf(),
            documents: paths.len(),
        });

        self.store.init().await?;
        if self.config.clean {
            info!("Clearing store before ingestion");
            self.store.delete_all().await?;
        }

        let batch_size = self.config.upsert_batch_size.max(1);
        let mut pending: Vec<DocumentChunk> = Vec::new();
        let mut documents = Vec::with_capacity(paths.len());
        let mut total_chunks = 0;

        // `buffered` keeps discovery order while running documents concurrently
        let mut results = stream::iter(paths)
            .map(|path| async move {
                let result = self.ingest_document(&path).await;
                (path, result)
            })
            .buffered(self.config.concurrency.max(1));

        while let Some((path, result)) = results.next().await {
            let status = match result {
                Ok(chunks) => {
                    let chunk_count = chunks.len();
                    total_chunks += chunk_count;
                    pending.extend(chunks);
                    DocumentStatus::Chunked { chunk_count }
                }
                Err(error) => DocumentStatus::Failed { error },
            };
            documents.push(DocumentOutcome { path, status });

            while pending.len() >= batch_size {
                let batch: Vec<DocumentChunk> = pending.drain(..batch_size).collect();
                self.upsert(&batch).await?;
            }
        }
        if !pending.is_empty() {
            self.upsert(&pending).await?;
        }

        let report = IngestReport {
            corpus: corpus.to_path_buf(),
            documents,
            total_chunks,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            "Ingestion finished: {} documents, {} failed, {} chunks in {} ms",
            report.documents.len(),
            report.failed(),
            report.total_chunks,
            report.elapsed_ms
        );
        let _ = self.update_tx.send(IngestUpdate::RunCompleted {
            total_chunks: report.total_chunks,
            failed: report.failed(),
        });
        Ok(report)
    }

    /// Process and chunk one document, returning the failure message on error.
    async fn ingest_document(
        &self,
        path: &Path,
    ) -> std::result::Result<Vec<DocumentChunk>, String> {
        let _ = self.update_tx.send(IngestUpdate::DocumentStarted {
            path: path.to_path_buf(),
        });

        let timeout = self.config.document_timeout;
        let outcome = match tokio::time::timeout(timeout, self.process_and_chunk(path)).await {
            Ok(Ok(chunks)) => Ok(chunks),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => {
                // A chunking task already on the blocking pool is detached, not stopped.
                debug!(
                    "Abandoning {:?} after {:?}; blocking chunk work may still be running",
                    path, timeout
                );
                Err(format!("timed out after {}s", timeout.as_secs_f64()))
            }
        };

        match &outcome {
            Ok(chunks) => {
                debug!("Chunked {:?} into {} chunks", path, chunks.len());
                let _ = self.update_tx.send(IngestUpdate::DocumentChunked {
                    path: path.to_path_buf(),
                    chunk_count: chunks.len(),
                });
            }
            Err(error) => {
                warn!("Failed to ingest {:?}: {}", path, error);
                let _ = self.update_tx.send(IngestUpdate::DocumentFailed {
                    path: path.to_path_buf(),
                    error: error.clone(),
                });
            }
        }
        outcome
    }

    async fn process_and_chunk(&self, path: &Path) -> Result<Vec<DocumentChunk>> {
        let document = self.processor.process_file(path).await?;
        let chunker = Arc::clone(&self.chunker);

        // Chunking is CPU-bound
        let chunks = tokio::task::spawn_blocking(move || chunker.chunk_document(&document))
            .await
            .map_err(|e| Error::Other(format!("chunking task failed: {e}")))??;
        Ok(chunks)
    }

    async fn upsert(&self, batch: &[DocumentChunk]) -> Result<()> {
        self.store.upsert_chunks(batch).await?;
        debug!("Upserted batch of {} chunks", batch.len());
        let _ = self.update_tx.send(IngestUpdate::BatchUpserted {
            chunk_count: batch.len(),
        });
        Ok(())
    }
}

fn discover_blocking(root: &Path) -> Result<Vec<PathBuf>> {
    use std::fs;

    fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
    }

    fn visit_dir(dir: &Path, found: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Cannot read directory {:?}: {}", dir, e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            if path.is_dir() {
                visit_dir(&path, found);
            } else if path.is_file() && FileType::from_path(&path).is_some() {
                found.push(path);
            }
        }
    }

    let metadata = fs::metadata(root)?;
    let mut found = Vec::new();
    if metadata.is_file() {
        if FileType::from_path(root).is_some() {
            found.push(root.to_path_buf());
        }
    } else {
        // The corpus root itself must be readable
        fs::read_dir(root)?;
        visit_dir(root, &mut found);
    }

    found.sort();
    debug!("Discovered {} documents under {:?}", found.len(), root);
    Ok(found)
}
