//! Tab error types

use thiserror::Error;

use crate::tab::TabId;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(TabId),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Recoverable: the UI warns and the registry is left untouched.
    #[error("Tab registry is full ({max} tabs)")]
    RegistryFull { max: usize },

    #[error("Cannot restore into a registry that already holds tabs")]
    RestoreIntoPopulated,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Render surface state could not be restored: {0}")]
pub struct SurfaceError(pub String);
