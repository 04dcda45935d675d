//! Harbor Suggestions
//!
//! Address bar suggestions. Several independent sources are queried for the
//! same prefix; the aggregator caps each one, adds a "search the web" entry
//! when the remote engine had little to say, and merges everything into a
//! single list ordered by kind.

mod aggregator;
mod error;
mod input;
mod item;
mod merge;
mod remote;
mod source;

pub use aggregator::{SuggestLayout, SuggestionAggregator, DEFAULT_WEB_SEARCH_THRESHOLD};
pub use error::SuggestError;
pub use input::{looks_like_url, normalize_url, search_url};
pub use item::{SuggestExtra, SuggestItem, SuggestKind};
pub use merge::MergedSuggestions;
pub use remote::{parse_suggestions, RemoteSuggestSource};
pub use source::{
    BookmarkHistorySource, SearchHistorySource, SuggestQuery, SuggestedUrlSource, SuggestionSource,
};

pub type Result<T> = std::result::Result<T, SuggestError>;
