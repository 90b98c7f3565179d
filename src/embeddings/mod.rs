// Embeddings module
// Ollama-backed text embeddings and paragraph chunking

pub mod chunking;
pub mod ollama;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::{RagError, Result};

pub use chunking::{ContentChunk, chunk_document, chunk_text, estimate_token_count};
pub use ollama::OllamaClient;

/// Length of every vector produced by the default embedding model
pub const DIMENSION: usize = 384;

/// Maps text to a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Reject a vector whose length differs from the expected dimension or that holds NaN or infinity
#[inline]
pub fn check_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(RagError::EmbeddingFailure(format!(
            "expected a {}-dimension vector, got {}",
            expected,
            vector.len()
        )));
    }

    if let Some(position) = vector.iter().position(|v| !v.is_finite()) {
        return Err(RagError::EmbeddingFailure(format!(
            "vector component {} is not finite",
            position
        )));
    }

    Ok(())
}
