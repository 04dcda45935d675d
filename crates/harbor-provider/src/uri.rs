//! Content URI routing

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ProviderError;

pub const AUTHORITY: &str = "browser";

const SUGGEST_PATH: &str = "search_suggest_query";

/// A routed `content://browser/...` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserUri {
    Bookmarks,
    Bookmark(i64),
    Searches,
    Search(i64),
    Suggest { query: String, limit: Option<u32> },
}

impl BrowserUri {
    pub fn suggest(query: impl Into<String>) -> Self {
        BrowserUri::Suggest {
            query: query.into(),
            limit: None,
        }
    }

    /// MIME type reported by the type-discovery verb.
    pub fn mime_type(&self) -> &'static str {
        match self {
            BrowserUri::Bookmarks => "vnd.android.cursor.dir/bookmark",
            BrowserUri::Bookmark(_) => "vnd.android.cursor.item/bookmark",
            BrowserUri::Searches => "vnd.android.cursor.dir/searches",
            BrowserUri::Search(_) => "vnd.android.cursor.item/searches",
            BrowserUri::Suggest { .. } => "vnd.android.cursor.dir/vnd.android.search.suggest",
        }
    }

    /// Returns the row id for single-item URIs
    pub fn row_id(&self) -> Option<i64> {
        match self {
            BrowserUri::Bookmark(id) | BrowserUri::Search(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_item(&self) -> bool {
        self.row_id().is_some()
    }
}

impl FromStr for BrowserUri {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ProviderError::UnknownUri(s.to_string());

        let url = Url::parse(s).map_err(|_| unknown())?;
        if url.scheme() != "content" || url.host_str() != Some(AUTHORITY) {
            return Err(unknown());
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let parse_id = |raw: &str| raw.parse::<i64>().map_err(|_| unknown());

        match segments.as_slice() {
            ["bookmarks"] => Ok(BrowserUri::Bookmarks),
            ["bookmarks", id] => Ok(BrowserUri::Bookmark(parse_id(id)?)),
            ["searches"] => Ok(BrowserUri::Searches),
            ["searches", id] => Ok(BrowserUri::Search(parse_id(id)?)),
            [SUGGEST_PATH] => {
                let mut query = String::new();
                let mut limit = None;
                for (key, value) in url.query_pairs() {
                    match key.as_ref() {
                        "q" => query = value.into_owned(),
                        "limit" => {
                            limit = Some(value.parse::<u32>().map_err(|_| {
                                ProviderError::IllegalArgument(format!("bad limit: {value}"))
                            })?)
                        }
                        _ => {}
                    }
                }
                Ok(BrowserUri::Suggest { query, limit })
            }
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for BrowserUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserUri::Bookmarks => write!(f, "content://{AUTHORITY}/bookmarks"),
            BrowserUri::Bookmark(id) => write!(f, "content://{AUTHORITY}/bookmarks/{id}"),
            BrowserUri::Searches => write!(f, "content://{AUTHORITY}/searches"),
            BrowserUri::Search(id) => write!(f, "content://{AUTHORITY}/searches/{id}"),
            BrowserUri::Suggest { query, limit } => {
                let encoded: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("q", query)
                    .finish();
                write!(f, "content://{AUTHORITY}/{SUGGEST_PATH}?{encoded}")?;
                if let Some(limit) = limit {
                    write!(f, "&limit={limit}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(
            "content://browser/bookmarks".parse::<BrowserUri>().unwrap(),
            BrowserUri::Bookmarks
        );
        assert_eq!(
            "content://browser/bookmarks/42".parse::<BrowserUri>().unwrap(),
            BrowserUri::Bookmark(42)
        );
        assert_eq!(
            "content://browser/searches/".parse::<BrowserUri>().unwrap(),
            BrowserUri::Searches
        );
        assert_eq!(
            "content://browser/searches/7".parse::<BrowserUri>().unwrap(),
            BrowserUri::Search(7)
        );
    }

    #[test]
    fn test_parse_suggest() {
        let uri: BrowserUri = "content://browser/search_suggest_query?q=good%20pizza&limit=5"
            .parse()
            .unwrap();
        assert_eq!(
            uri,
            BrowserUri::Suggest {
                query: "good pizza".to_string(),
                limit: Some(5)
            }
        );

        // Display percent-encodes the query and parses back
        let reparsed: BrowserUri = uri.to_string().parse().unwrap();
        assert_eq!(reparsed, uri);
    }

    #[test]
    fn test_unknown_uris() {
        for raw in [
            "content://browser/history",
            "content://contacts/bookmarks",
            "http://browser/bookmarks",
            "content://browser/bookmarks/abc",
            "content://browser/bookmarks/1/2",
            "not a uri",
        ] {
            assert!(
                matches!(raw.parse::<BrowserUri>(), Err(ProviderError::UnknownUri(_))),
                "{raw} should be unknown"
            );
        }
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(
            BrowserUri::Bookmarks.mime_type(),
            "vnd.android.cursor.dir/bookmark"
        );
        assert_eq!(
            BrowserUri::Search(1).mime_type(),
            "vnd.android.cursor.item/searches"
        );
        assert!(BrowserUri::Bookmark(3).is_item());
        assert!(!BrowserUri::suggest("x").is_item());
    }
}
