// Ingestion and question answering over the selected vector store

#[cfg(test)]
mod tests;

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::embeddings::{Embedder, check_dimension, chunk_document};
use crate::extract::{TextExtractor, ensure_pdf_filename};
use crate::store::{ChunkRecord, QueryOutcome, VectorStore};
use crate::{RagError, Result};

/// Number of chunks retrieved for every question
pub const TOP_K: usize = 3;

pub const NO_DOCUMENTS_MESSAGE: &str = "No documents uploaded yet.";
pub const NO_RELEVANT_MESSAGE: &str = "No relevant information found.";

/// Separator placed between retrieved chunks in an answer
pub const ANSWER_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub chunks_stored: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub answer: String,
}

/// Extract, chunk, embed and store uploaded documents
#[derive(Clone)]
pub struct IngestPipeline {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl IngestPipeline {
    #[inline]
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            store,
        }
    }

    /// Store every paragraph of the document, returning how many were stored.
    ///
    /// The whole document is embedded before anything is written, so an
    /// embedding failure leaves the store untouched.
    #[inline]
    pub async fn ingest(&self, bytes: Vec<u8>, filename: &str) -> Result<IngestReport> {
        ensure_pdf_filename(filename)?;

        info!("Ingesting {} ({} bytes)", filename, bytes.len());

        let extractor = Arc::clone(&self.extractor);
        let owned_name = filename.to_string();
        let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes, &owned_name))
            .await
            .map_err(|e| RagError::InvalidPdf {
                filename: filename.to_string(),
                message: format!("text extraction aborted: {}", e),
            })??;

        let chunks = chunk_document(&text);
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument {
                filename: filename.to_string(),
            });
        }

        let texts: Vec<String> = chunks.into_iter().map(|c| c.content).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingFailure(format!(
                "embedded {} of {} chunks",
                vectors.len(),
                texts.len()
            )));
        }

        let dimension = self.embedder.dimension();
        for vector in &vectors {
            check_dimension(vector, dimension)?;
        }

        let records: Vec<ChunkRecord> = texts
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(index, (text, vector))| ChunkRecord::new(filename, index, vector, text))
            .collect();

        let chunks_stored = records.len();
        self.store.upsert(records).await?;

        info!(
            "Stored {} chunks from {} in {} backend",
            chunks_stored,
            filename,
            self.store.kind()
        );

        Ok(IngestReport { chunks_stored })
    }
}

/// Answer questions by concatenating the closest stored paragraphs
#[derive(Clone)]
pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl QueryPipeline {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    #[inline]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::MissingQuestion);
        }

        let vector = self.embedder.embed(question).await?;
        check_dimension(&vector, self.embedder.dimension())?;

        let answer = match self.store.query(&vector, TOP_K).await? {
            QueryOutcome::NoDocuments => NO_DOCUMENTS_MESSAGE.to_string(),
            QueryOutcome::Ranked(results) if results.is_empty() => NO_RELEVANT_MESSAGE.to_string(),
            QueryOutcome::Ranked(results) => {
                debug!(
                    "Answering from {} chunks, best score {}",
                    results.len(),
                    results[0].score
                );
                results
                    .into_iter()
                    .map(|r| r.text)
                    .collect::<Vec<_>>()
                    .join(ANSWER_SEPARATOR)
            }
        };

        Ok(Answer { answer })
    }
}
