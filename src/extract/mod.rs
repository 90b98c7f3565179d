// PDF text extraction
// Wraps `pdf-extract` behind a trait so ingestion can run against plain text in tests


use std::path::Path;

use tracing::debug;

use crate::{RagError, Result};

/// Turns uploaded file bytes into plain text
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8], filename: &str) -> Result<String>;
}

/// Extracts text from PDF documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    #[inline]
    fn extract_text(&self, bytes: &[u8], filename: &str) -> Result<String> {
        debug!("Extracting text from {} ({} bytes)", filename, bytes.len());

        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| RagError::InvalidPdf {
            filename: filename.to_string(),
            message: e.to_string(),
        })?;

        debug!("Extracted {} characters from {}", text.len(), filename);
        Ok(text)
    }
}

/// Whether the filename carries a `.pdf` extension (case-insensitive)
#[inline]
pub fn is_pdf_filename(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Reject uploads that are not named like PDF files
#[inline]
pub fn ensure_pdf_filename(filename: &str) -> Result<()> {
    if is_pdf_filename(filename) {
        Ok(())
    } else {
        Err(RagError::UnsupportedFileType {
            filename: filename.to_string(),
        })
    }
}
