use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing the policy file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed policy file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode policy file: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid community id {0:?} in policy file")]
    InvalidCommunity(String),
    #[error("policy store lock poisoned")]
    Poisoned,
}
