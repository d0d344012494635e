//! Client error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure: the request never completed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status or a body that is not the expected JSON
    #[error("Protocol error (HTTP {status}): {message}")]
    Protocol { status: u16, message: String },

    /// Server-reported application error (`status: "error"` / `success: false`)
    #[error("Server error: {0}")]
    Application(String),

    /// File rejected before any network call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A chunk exhausted its retry budget
    #[error("Chunk {index} failed after {attempts} attempt(s): {source}")]
    ChunkFailed {
        index: usize,
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    /// A single-request upload exhausted its retry budget
    #[error("Upload failed after {attempts} attempt(s): {source}")]
    UploadFailed {
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    /// Every chunk was acknowledged but the server never sent a completion URL
    #[error("Upload incomplete: all {total_chunks} chunk(s) sent without a completion URL")]
    Incomplete { total_chunks: usize },

    /// The caller cancelled the upload
    #[error("Upload cancelled before chunk {chunk_index}")]
    Cancelled { chunk_index: usize },

    /// The job already reached a terminal state
    #[error("Upload job already finished")]
    JobFinished,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while reading the source file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a file is refused before upload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("file is empty")]
    EmptyFile,

    #[error("unsupported file type {found:?}, expected {expected}/*")]
    UnsupportedType { expected: &'static str, found: String },

    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl ClientError {
    /// Build a protocol error from a response status and body
    pub fn protocol(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            "empty response body".to_string()
        } else {
            truncate(body.trim(), 200)
        };
        Self::Protocol { status, message }
    }

    /// Whether another attempt at the same request could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Protocol { .. } | Self::Application(_)
        )
    }

    /// Check if this is a pre-flight validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if the upload was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Index of the chunk that failed, when the error is chunk-specific
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::ChunkFailed { index, .. } => Some(*index),
            Self::Cancelled { chunk_index } => Some(*chunk_index),
            _ => None,
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
