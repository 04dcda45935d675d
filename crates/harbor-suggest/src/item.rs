//! Suggestion items

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a suggestion came from. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestKind {
    SearchHistory,
    RemoteSuggestion,
    Bookmark,
    SuggestedUrl,
    BrowsingHistory,
}

impl SuggestKind {
    pub const ALL: [SuggestKind; 5] = [
        SuggestKind::SearchHistory,
        SuggestKind::RemoteSuggestion,
        SuggestKind::Bookmark,
        SuggestKind::SuggestedUrl,
        SuggestKind::BrowsingHistory,
    ];

    /// Lower comes first
    pub fn priority(&self) -> usize {
        match self {
            SuggestKind::SearchHistory => 0,
            SuggestKind::RemoteSuggestion => 1,
            SuggestKind::Bookmark => 2,
            SuggestKind::SuggestedUrl => 3,
            SuggestKind::BrowsingHistory => 4,
        }
    }

    /// Search-type kinds share the search column in the landscape layout.
    pub fn is_search(&self) -> bool {
        matches!(self, SuggestKind::SearchHistory | SuggestKind::RemoteSuggestion)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestKind::SearchHistory => "search_history",
            SuggestKind::RemoteSuggestion => "remote_suggestion",
            SuggestKind::Bookmark => "bookmark",
            SuggestKind::SuggestedUrl => "suggested_url",
            SuggestKind::BrowsingHistory => "browsing_history",
        }
    }
}

impl fmt::Display for SuggestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestExtra {
    /// "Search the web for ..." entry
    WebSearch { query: String },
    /// Deep-link payload handed back to the host when picked
    Action { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestItem {
    pub title: String,
    pub url: Option<String>,
    pub kind: SuggestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<SuggestExtra>,
}

impl SuggestItem {
    pub fn new(kind: SuggestKind, title: impl Into<String>, url: Option<String>) -> Self {
        Self {
            title: title.into(),
            url,
            kind,
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: SuggestExtra) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn web_search(query: &str) -> Self {
        Self::new(SuggestKind::RemoteSuggestion, query, None).with_extra(SuggestExtra::WebSearch {
            query: query.to_string(),
        })
    }

    pub fn is_web_search(&self) -> bool {
        matches!(self.extra, Some(SuggestExtra::WebSearch { .. }))
    }

    /// Text to put into the address bar when the item is picked
    pub fn text(&self) -> &str {
        match (&self.extra, &self.url) {
            (Some(SuggestExtra::WebSearch { query }), _) => query,
            (_, Some(url)) if !self.kind.is_search() => url,
            _ => &self.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_matches_declaration_order() {
        for pair in SuggestKind::ALL.windows(2) {
            assert!(pair[0].priority() < pair[1].priority());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_search_kinds() {
        assert!(SuggestKind::SearchHistory.is_search());
        assert!(SuggestKind::RemoteSuggestion.is_search());
        assert!(!SuggestKind::Bookmark.is_search());
        assert!(!SuggestKind::BrowsingHistory.is_search());
    }

    #[test]
    fn test_text() {
        let bookmark = SuggestItem::new(
            SuggestKind::Bookmark,
            "Google",
            Some("https://google.com/".to_string()),
        );
        assert_eq!(bookmark.text(), "https://google.com/");

        let search = SuggestItem::new(SuggestKind::SearchHistory, "good food", None);
        assert_eq!(search.text(), "good food");

        let web = SuggestItem::web_search("goo");
        assert!(web.is_web_search());
        assert_eq!(web.text(), "goo");
    }

    #[test]
    fn test_extra_serialization() {
        let item = SuggestItem::new(SuggestKind::SuggestedUrl, "x", None).with_extra(
            SuggestExtra::Action {
                name: "open".to_string(),
            },
        );
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"kind\":\"suggested_url\""));
        assert!(json.contains("\"type\":\"action\""));
    }
}
