//! Error types for the store and the command handlers

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write store {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode store record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store backend unavailable: {0}")]
    Unavailable(String),

    #[error("key {key} is already in use for {existing}")]
    KeyExists { key: String, existing: String },

    #[error("key {0} doesn't exist")]
    KeyMissing(String),
}

/// Internal faults raised by a handler. Caught at the dispatch boundary.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("could not build link: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Internal(String),
}
