use std::path::PathBuf;

/// Failure talking to the remote tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why an assignee name could not be turned into an account id.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no account matches '{0}'")]
    NotFound(String),

    #[error("lookup for '{name}' failed: {source}")]
    Lookup {
        name: String,
        #[source]
        source: TrackerError,
    },
}

/// Failure reading or writing the tabular file.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("header is missing required column '{0}'")]
    MissingColumn(String),
}
