//! Harbor Storage Layer
//!
//! SQLite persistence for bookmarks, browsing history, saved searches and
//! runtime settings. The connection is shared process-wide and serializes
//! access itself.

mod database;
mod error;
mod migrations;

pub use database::{now_millis, Database};
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
