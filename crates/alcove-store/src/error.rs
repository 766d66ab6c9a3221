use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A path did not have the `collection/doc[/collection/doc...]` shape.
    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    /// Serialization of a document failed.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Transient backend failure (network, service outage). Surfaced to the
    /// caller; the core never retries automatically.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
