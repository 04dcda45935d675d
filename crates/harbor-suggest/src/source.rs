//! Suggestion sources
//!
//! Every source decides on its own whether a prefix is relevant to it. Local
//! sources read the browser provider on the blocking pool.

use futures_util::future::BoxFuture;

use harbor_provider::{BrowserProvider, BrowserUri, Selection};

use crate::input::normalize_url;
use crate::item::{SuggestItem, SuggestKind};
use crate::Result;

/// One suggestion request as seen by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestQuery {
    pub prefix: String,
    /// Most items this source may contribute
    pub limit: usize,
    pub incognito: bool,
}

pub trait SuggestionSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Kind used to pick this source's budget. Sources may still emit items
    /// of other kinds.
    fn kind(&self) -> SuggestKind;

    /// Whether the source still runs for an empty prefix
    fn wants_empty_query(&self) -> bool {
        false
    }

    fn query(&self, query: SuggestQuery) -> BoxFuture<'_, Result<Vec<SuggestItem>>>;
}

/// Bookmarks and visited pages matching the prefix.
pub struct BookmarkHistorySource {
    provider: BrowserProvider,
}

impl BookmarkHistorySource {
    pub fn new(provider: BrowserProvider) -> Self {
        Self { provider }
    }
}

impl SuggestionSource for BookmarkHistorySource {
    fn name(&self) -> &'static str {
        "bookmarks"
    }

    fn kind(&self) -> SuggestKind {
        SuggestKind::Bookmark
    }

    fn query(&self, query: SuggestQuery) -> BoxFuture<'_, Result<Vec<SuggestItem>>> {
        let provider = self.provider.clone();
        Box::pin(async move {
            let rows = tokio::task::spawn_blocking(move || {
                let uri = BrowserUri::Suggest {
                    query: query.prefix,
                    limit: Some(u32::try_from(query.limit).unwrap_or(u32::MAX)),
                };
                provider.query(&uri, &Selection::all(), None)
            })
            .await??
            .into_bookmarks();

            Ok(rows
                .into_iter()
                .map(|row| {
                    let kind = if row.bookmark {
                        SuggestKind::Bookmark
                    } else {
                        SuggestKind::BrowsingHistory
                    };
                    SuggestItem::new(kind, row.display_title(), Some(row.url.clone()))
                })
                .collect())
        })
    }
}

/// Previously issued searches, newest first.
pub struct SearchHistorySource {
    provider: BrowserProvider,
}

impl SearchHistorySource {
    pub fn new(provider: BrowserProvider) -> Self {
        Self { provider }
    }
}

impl SuggestionSource for SearchHistorySource {
    fn name(&self) -> &'static str {
        "searches"
    }

    fn kind(&self) -> SuggestKind {
        SuggestKind::SearchHistory
    }

    /// An empty prefix shows recent searches
    fn wants_empty_query(&self) -> bool {
        true
    }

    fn query(&self, query: SuggestQuery) -> BoxFuture<'_, Result<Vec<SuggestItem>>> {
        let provider = self.provider.clone();
        Box::pin(async move {
            let rows = tokio::task::spawn_blocking(move || {
                let prefix = query.prefix.trim();
                let selection = if prefix.is_empty() {
                    Selection::all()
                } else {
                    Selection::new("search LIKE ?").arg(format!("{prefix}%"))
                };
                provider.query(
                    &BrowserUri::Searches,
                    &selection.limit(u32::try_from(query.limit).unwrap_or(u32::MAX)),
                    Some("date DESC"),
                )
            })
            .await??
            .into_searches();

            Ok(rows
                .into_iter()
                .map(|row| SuggestItem::new(SuggestKind::SearchHistory, row.search, None))
                .collect())
        })
    }
}

/// Offers the typed text itself as an address when it looks like one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuggestedUrlSource;

impl SuggestionSource for SuggestedUrlSource {
    fn name(&self) -> &'static str {
        "typed_url"
    }

    fn kind(&self) -> SuggestKind {
        SuggestKind::SuggestedUrl
    }

    fn query(&self, query: SuggestQuery) -> BoxFuture<'_, Result<Vec<SuggestItem>>> {
        Box::pin(async move {
            if query.limit == 0 {
                return Ok(Vec::new());
            }
            Ok(normalize_url(&query.prefix)
                .map(|url| SuggestItem::new(SuggestKind::SuggestedUrl, url.clone(), Some(url)))
                .into_iter()
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_provider::{BookmarkValues, ContentValues};
    use harbor_storage::Database;

    fn provider() -> BrowserProvider {
        BrowserProvider::new(Database::open_in_memory().unwrap())
    }

    fn request(prefix: &str, limit: usize) -> SuggestQuery {
        SuggestQuery {
            prefix: prefix.to_string(),
            limit,
            incognito: false,
        }
    }

    #[tokio::test]
    async fn test_bookmark_history_kinds() {
        let provider = provider();
        provider
            .insert(
                &BrowserUri::Bookmarks,
                ContentValues::Bookmark(BookmarkValues::bookmark(
                    "Google",
                    "http://www.google.com/",
                )),
            )
            .unwrap();
        provider
            .update_visited_history("https://goodreads.com/", "Goodreads")
            .unwrap();

        let source = BookmarkHistorySource::new(provider);
        let items = source.query(request("goo", 5)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items
            .iter()
            .any(|i| i.kind == SuggestKind::Bookmark && i.title == "Google"));
        assert!(items
            .iter()
            .any(|i| i.kind == SuggestKind::BrowsingHistory && i.title == "Goodreads"));

        let capped = source.query(request("goo", 1)).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_limit_is_not_truncated() {
        let provider = provider();
        provider.record_search("good food").unwrap();
        provider
            .update_visited_history("https://goodreads.com/", "Goodreads")
            .unwrap();

        // Wider than u32: must saturate rather than wrap to zero
        let limit = usize::try_from(u64::from(u32::MAX) + 1).unwrap_or(usize::MAX);
        let searches = SearchHistorySource::new(provider.clone())
            .query(request("goo", limit))
            .await
            .unwrap();
        assert_eq!(searches.len(), 1);

        let history = BookmarkHistorySource::new(provider)
            .query(request("goo", limit))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_search_history_prefix_and_recent() {
        let provider = provider();
        provider.record_search("good food").unwrap();
        provider.record_search("rust").unwrap();

        let source = SearchHistorySource::new(provider);
        assert!(source.wants_empty_query());

        let items = source.query(request("goo", 5)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "good food");

        let recent = source.query(request("", 5)).await.unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn test_suggested_url() {
        let source = SuggestedUrlSource;
        let items = source.query(request("example.com", 3)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url.as_deref(), Some("https://example.com"));

        assert!(source.query(request("goo", 3)).await.unwrap().is_empty());
    }
}
