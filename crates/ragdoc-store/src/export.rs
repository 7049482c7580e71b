//! JSON Lines export adapter.
//!
//! [`JsonlStore`] writes one [`VectorRecord`] per line so that chunks can be
//! loaded into an external vector database. Upserting an existing id
//! replaces its line in place. It does not embed and cannot be
//! queried.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragdoc_core::{DocumentChunk, SearchMatch, StoreError, StoreStats, VectorStore};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::record::VectorRecord;

/// Store that keeps one record per chunk id in a `.jsonl` file.
pub struct JsonlStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Create a store writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Output file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the file.
    pub async fn read_records(&self) -> Result<Vec<VectorRecord>, StoreError> {
        self.load().await.map_err(StoreError::Query)
    }

    async fn load(&self) -> Result<Vec<VectorRecord>, String> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(format!("{}: {e}", self.path.display())),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| format!("line {}: {e}", i + 1))
            })
            .collect()
    }
}

fn to_lines(records: &[VectorRecord]) -> Result<String, StoreError> {
    let mut buffer = String::new();
    for record in records {
        let line = serde_json::to_string(record).map_err(|e| StoreError::Upsert(e.to_string()))?;
        buffer.push_str(&line);
        buffer.push('\n');
    }
    Ok(buffer)
}

#[async_trait]
impl VectorStore for JsonlStore {
    async fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Init(format!("{}: {e}", parent.display())))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::Init(format!("{}: {e}", self.path.display())))?;

        debug!("JsonlStore initialized at {:?}", self.path);
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), StoreError> {
        let incoming: Vec<VectorRecord> = chunks.iter().map(VectorRecord::from_chunk).collect();

        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await.map_err(StoreError::Upsert)?;
        let mut positions: HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        let existing = records.len();
        let mut replaced = 0;
        for record in incoming {
            match positions.get(&record.id) {
                Some(&i) => {
                    records[i] = record;
                    replaced += 1;
                }
                None => {
                    positions.insert(record.id.clone(), records.len());
                    records.push(record);
                }
            }
        }

        if replaced == 0 {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| StoreError::Upsert(format!("{}: {e}", self.path.display())))?;
            file.write_all(to_lines(&records[existing..])?.as_bytes())
                .await
                .map_err(|e| StoreError::Upsert(e.to_string()))?;
            file.flush()
                .await
                .map_err(|e| StoreError::Upsert(e.to_string()))?;
        } else {
            fs::write(&self.path, to_lines(&records)?)
                .await
                .map_err(|e| StoreError::Upsert(format!("{}: {e}", self.path.display())))?;
        }

        debug!(
            "Upserted {} records to {:?} ({} replaced)",
            chunks.len(),
            self.path,
            replaced
        );
        Ok(())
    }

    async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<SearchMatch>, StoreError> {
        Err(StoreError::Unsupported("query"))
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        fs::File::create(&self.path)
            .await
            .map_err(|e| StoreError::Delete(format!("{}: {e}", self.path.display())))?;
        debug!("Truncated {:?}", self.path);
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let records = self.read_records().await?;
        let files: HashSet<&str> = records.iter().filter_map(VectorRecord::file_name).collect();
        let last_updated = fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(StoreStats {
            total_chunks: records.len() as u64,
            total_files: files.len() as u64,
            last_updated,
        })
    }
}
