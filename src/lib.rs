use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Unsupported file type: {filename} (only PDF files are supported)")]
    UnsupportedFileType { filename: String },

    #[error("No text extracted from {filename}")]
    EmptyDocument { filename: String },

    #[error("Could not read PDF {filename}: {message}")]
    InvalidPdf { filename: String, message: String },

    #[error("Request must include a non-empty question")]
    MissingQuestion,

    #[error("Vector backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Malformed persisted store at {path}: {message}")]
    MalformedPersistedState { path: String, message: String },

    #[error("Embedding error: {0}")]
    EmbeddingFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Whether the error was caused by the caller's input rather than the service
    #[inline]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFileType { .. }
                | Self::EmptyDocument { .. }
                | Self::InvalidPdf { .. }
                | Self::MissingQuestion
        )
    }
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod pipeline;
pub mod server;
pub mod store;
