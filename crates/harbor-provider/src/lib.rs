//! Harbor Browser Provider
//!
//! Routes `content://browser/...` URIs onto the bookmarks and searches
//! tables. Everything below this boundary reports failures as
//! [`ProviderError`]; callers above it only see absence of rows.

mod error;
mod provider;
mod rows;
mod uri;

pub use error::ProviderError;
pub use provider::{BrowserProvider, Selection};
pub use rows::{BookmarkRow, BookmarkValues, ContentValues, ProviderRows, SearchRow, SearchValues};
pub use uri::{BrowserUri, AUTHORITY};

pub type Result<T> = std::result::Result<T, ProviderError>;
