
use tracing::debug;

/// Separator between retrievable paragraphs in extracted text
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Represents a chunk of document text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// The trimmed chunk text
    pub content: String,
    /// The index of this chunk within the document
    pub chunk_index: usize,
    /// Estimated token count
    pub token_count: usize,
}

/// Lazily split document text into non-empty trimmed chunks on blank lines.
///
/// Whitespace-only segments are skipped and do not consume an index, so the
/// indices of the yielded chunks are always `0..n`.
#[inline]
pub fn chunk_text(text: &str) -> impl Iterator<Item = ContentChunk> + '_ {
    text.split(CHUNK_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(chunk_index, segment)| ContentChunk {
            content: segment.to_string(),
            chunk_index,
            token_count: estimate_token_count(segment),
        })
}

/// Collect every chunk of a document, logging a short summary
#[inline]
pub fn chunk_document(text: &str) -> Vec<ContentChunk> {
    let chunks: Vec<ContentChunk> = chunk_text(text).collect();

    debug!(
        "Chunked document into {} chunks (avg {} tokens)",
        chunks.len(),
        chunks.iter().map(|c| c.token_count).sum::<usize>() / chunks.len().max(1)
    );

    chunks
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
