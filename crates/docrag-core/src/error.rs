use thiserror::Error;

/// Failures the pipeline must tell apart.
///
/// Per-document variants (`UnsupportedFormat`, `Extraction`) are recorded and
/// skipped during indexing. `Store` is fatal for an indexing run. The
/// transport-level variants are returned to query callers as error payloads.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed for {path}: {message}")]
    Extraction { path: String, message: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Collection was indexed with embedder '{expected}' but the query embedder is '{actual}'")]
    EmbedderMismatch { expected: String, actual: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn extraction(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Extraction { path: path.into(), message: message.to_string() }
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
