//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] harbor_storage::StorageError),

    #[error("Provider error: {0}")]
    Provider(#[from] harbor_provider::ProviderError),

    #[error("Suggestion error: {0}")]
    Suggest(#[from] harbor_suggest::SuggestError),

    #[error("Tab error: {0}")]
    Tab(#[from] harbor_tabs::TabError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Browser controller has shut down")]
    ControllerClosed,
}
