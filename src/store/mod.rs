// Vector storage module
// A remote vector index service and a local JSON-file store behind one trait

pub mod backend;
pub mod local;
pub mod remote;


use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

pub use backend::{BackendReport, BackendSelection, inspect_backend, select_backend};
pub use local::LocalStore;
pub use remote::{RemoteIndex, RemoteIndexClient};

/// One embedded chunk of an uploaded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// `"{filename}_{chunk_index}"`
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(rename = "meta")]
    pub metadata: ChunkMetadata,
}

/// Metadata stored alongside each vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// The chunk text returned to callers on retrieval
    pub text: String,
    #[serde(rename = "filename")]
    pub source_filename: String,
}

impl ChunkRecord {
    #[inline]
    pub fn new(source_filename: &str, chunk_index: usize, vector: Vec<f32>, text: String) -> Self {
        Self {
            id: chunk_id(source_filename, chunk_index),
            vector,
            metadata: ChunkMetadata {
                text,
                source_filename: source_filename.to_string(),
            },
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.metadata.text
    }
}

/// Identifier of a chunk within its source document
#[inline]
pub fn chunk_id(source_filename: &str, chunk_index: usize) -> String {
    format!("{}_{}", source_filename, chunk_index)
}

/// A retrieved chunk text with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub text: String,
}

/// Result of a similarity query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The store holds no records at all
    NoDocuments,
    /// Best matches first, at most `top_k` long
    Ranked(Vec<ScoredChunk>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Remote,
    Local,
}

impl fmt::Display for BackendKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Storage backend for chunk embeddings with similarity search
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Store all records. Nothing is acknowledged until the backend has accepted the batch.
    async fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()>;

    /// Find the `top_k` records most similar to `vector`, best first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<QueryOutcome>;

    /// Number of stored records, when the backend can tell cheaply
    async fn record_count(&self) -> Option<usize> {
        None
    }
}

/// Cosine similarity of two vectors.
///
/// Returns `None` when the lengths differ, either vector has zero norm, or
/// the result is not finite. Finite results are clamped to `[-1, 1]`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, norm_a, norm_b), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (x.mul_add(y, dot), x.mul_add(x, norm_a), y.mul_add(y, norm_b))
        },
    );

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }

    let similarity = dot / denominator;
    similarity
        .is_finite()
        .then(|| similarity.clamp(-1.0, 1.0) as f32)
}

/// Ranking score of a stored vector; degenerate comparisons sort last
#[inline]
pub fn similarity_score(stored: &[f32], query: &[f32]) -> f32 {
    cosine_similarity(stored, query).unwrap_or(f32::NEG_INFINITY)
}
