//! Provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown URL: {0}")]
    UnknownUri(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
}

impl From<harbor_storage::StorageError> for ProviderError {
    fn from(err: harbor_storage::StorageError) -> Self {
        tracing::debug!(error = %err, "Storage failure at provider boundary");
        ProviderError::IllegalArgument(err.to_string())
    }
}
