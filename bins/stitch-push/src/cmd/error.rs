use stitch_api::IngestError;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("{0}")]
    Config(String),

    #[error("input ({path}): {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stdout: {0}")]
    Output(#[source] std::io::Error),

    #[error("{0}")]
    Ingest(#[from] IngestError),
}
