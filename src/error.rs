use thiserror::Error;

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The store file exists but is not the expected JSON object.
    #[error("Store is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}
