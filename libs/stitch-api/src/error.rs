/// Category of an ingest error. Lets the caller decide what to do with it
/// (fix config, fix input, give up on the submission).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration — permanent, fail at startup.
    Config,
    /// I/O or network error, including a batch refused by the API.
    Io,
    /// Data format/parse error — bad input.
    Format,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Format => f.write_str("format"),
        }
    }
}

/// Unified error type for decoding, batching and submission.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Input bytes are not a JSON array of objects.
    #[error("decode input: {0}")]
    Decode(#[source] serde_json::Error),

    /// A record's data payload could not be serialized for sizing.
    #[error("measure record #{index}: {source}")]
    Measure {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Batch payload could not be serialized for transport.
    #[error("encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("transport: {0}")]
    Io(String),

    /// The import API answered with a non-success status.
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl IngestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Decode(_) | IngestError::Measure { .. } | IngestError::Encode(_) => {
                ErrorKind::Format
            }
            IngestError::Config(_) => ErrorKind::Config,
            IngestError::Io(_) | IngestError::Rejected { .. } => ErrorKind::Io,
        }
    }
}
