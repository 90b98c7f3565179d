// Deterministic collaborators shared by the integration tests
#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use pdf_rag::embeddings::Embedder;
use pdf_rag::extract::TextExtractor;
use pdf_rag::{RagError, Result};

pub const VOCABULARY: [&str; 6] = [
    "paragraph a",
    "paragraph b",
    "rust",
    "python",
    "ownership",
    "garbage",
];

/// Embeds text as keyword counts over a small fixed vocabulary
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect())
    }
}

/// Embedder whose model is never reachable
pub struct OfflineEmbedder;

#[async_trait]
impl Embedder for OfflineEmbedder {
    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingFailure("connection refused".to_string()))
    }
}

/// Treats uploads as UTF-8 text so tests do not need real PDF files
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8], _filename: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
