use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LensError {
    #[error("invalid post id: {0}")]
    InvalidPostId(String),

    #[error("no post id found in input: {0}")]
    NoPostId(String),

    #[error("unknown projection: {0}")]
    InvalidProjection(String),

    #[error("no host configured: pass --host or set MM_HOST")]
    MissingHost,

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LensError>;
