//! Suggestion error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Provider error: {0}")]
    Provider(#[from] harbor_provider::ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed suggestion response: {0}")]
    Malformed(String),

    #[error("Suggestion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
