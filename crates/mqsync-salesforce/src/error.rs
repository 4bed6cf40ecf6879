use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
/// Failures while establishing an authenticated store session.
pub enum AuthError {
    #[error("failed to read signing key {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed signing key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("credentials rejected with status {status}: {error}: {description}")]
    Rejected {
        status: u16,
        error: String,
        description: String,
    },
    #[error("token endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
/// Failures of a query or collection call against the object store.
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
