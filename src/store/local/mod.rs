
use async_trait::async_trait;
use std::cmp::Ordering;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{BackendKind, ChunkRecord, QueryOutcome, ScoredChunk, VectorStore, similarity_score};
use crate::embeddings::check_dimension;
use crate::{RagError, Result};

/// Vector store kept in memory and mirrored to a single JSON file.
///
/// Every mutation rewrites the whole file while holding the record lock, so
/// concurrent uploads are serialized and the file always matches memory.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    dimension: usize,
    records: Mutex<Vec<ChunkRecord>>,
}

impl LocalStore {
    /// Open the store at `path`, loading any records persisted there
    #[inline]
    pub async fn open(path: impl Into<PathBuf>, dimension: usize) -> Result<Self> {
        let path = path.into();
        let records = Self::load_records(&path, dimension).await?;

        info!(
            "Local vector store opened at {} with {} records",
            path.display(),
            records.len()
        );

        Ok(Self {
            path,
            dimension,
            records: Mutex::new(records),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Snapshot of every stored record in insertion order
    #[inline]
    pub async fn records(&self) -> Vec<ChunkRecord> {
        self.records.lock().await.clone()
    }

    /// Write the current state to disk
    #[inline]
    pub async fn persist(&self) -> Result<()> {
        let records = self.records.lock().await;
        Self::write_records(&self.path, &records).await
    }

    async fn load_records(path: &Path, dimension: usize) -> Result<Vec<ChunkRecord>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No persisted store at {}, starting empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let malformed = |message: String| RagError::MalformedPersistedState {
            path: path.display().to_string(),
            message,
        };

        let records: Vec<ChunkRecord> =
            serde_json::from_slice(&bytes).map_err(|e| malformed(e.to_string()))?;

        if let Some(record) = records.iter().find(|r| r.vector.len() != dimension) {
            return Err(malformed(format!(
                "record {} has a {}-dimension vector, expected {}",
                record.id,
                record.vector.len(),
                dimension
            )));
        }

        Ok(records)
    }

    /// Replace the file atomically: write a sibling temp file, then rename it over the target
    async fn write_records(path: &Path, records: &[ChunkRecord]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec(records).map_err(|e| RagError::Other(e.into()))?;

        let mut tmp_name = path.file_name().map(OsString::from).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, &payload).await?;
        if let Err(e) = fs::rename(&tmp_path, path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e.into());
        }

        debug!(
            "Persisted {} records ({} bytes) to {}",
            records.len(),
            payload.len(),
            path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl VectorStore for LocalStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn upsert(&self, new_records: Vec<ChunkRecord>) -> Result<()> {
        for record in &new_records {
            check_dimension(&record.vector, self.dimension)?;
        }

        let mut records = self.records.lock().await;
        let previous_len = records.len();
        let added = new_records.len();
        records.extend(new_records);

        if let Err(e) = Self::write_records(&self.path, &records).await {
            error!(
                "Failed to persist local store to {}: {}",
                self.path.display(),
                e
            );
            records.truncate(previous_len);
            return Err(e);
        }

        info!(
            "Stored {} records in local store ({} total)",
            added,
            records.len()
        );
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<QueryOutcome> {
        let records = self.records.lock().await;

        if records.is_empty() {
            return Ok(QueryOutcome::NoDocuments);
        }

        let mut scored: Vec<(f32, &ChunkRecord)> = records
            .iter()
            .map(|record| (similarity_score(&record.vector, vector), record))
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let ranked: Vec<ScoredChunk> = scored
            .into_iter()
            .take(top_k)
            .map(|(score, record)| ScoredChunk {
                score,
                text: record.text().to_string(),
            })
            .collect();

        debug!(
            "Local query scanned {} records, returning {}",
            records.len(),
            ranked.len()
        );

        Ok(QueryOutcome::Ranked(ranked))
    }

    async fn record_count(&self) -> Option<usize> {
        Some(self.records.lock().await.len())
    }
}
