//! Suggestion Aggregator
//!
//! Fans one prefix out to every registered source, caps each contribution
//! according to the layout and merges the results by kind.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::input::looks_like_url;
use crate::item::{SuggestItem, SuggestKind};
use crate::merge::MergedSuggestions;
use crate::source::{SuggestQuery, SuggestionSource};

/// Below this many remote suggestions a "search the web" entry is added.
pub const DEFAULT_WEB_SEARCH_THRESHOLD: usize = 2;

/// How many lines each source may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "orientation", rename_all = "snake_case")]
pub enum SuggestLayout {
    /// One column, same budget for every source
    Portrait { lines: usize },
    /// Search-type sources get one column, everything else the other
    Landscape {
        search_lines: usize,
        other_lines: usize,
    },
}

impl SuggestLayout {
    pub fn budget(&self, kind: SuggestKind) -> usize {
        match *self {
            SuggestLayout::Portrait { lines } => lines,
            SuggestLayout::Landscape {
                search_lines,
                other_lines,
            } => {
                if kind.is_search() {
                    search_lines
                } else {
                    other_lines
                }
            }
        }
    }
}

impl Default for SuggestLayout {
    fn default() -> Self {
        SuggestLayout::Portrait { lines: 3 }
    }
}

pub struct SuggestionAggregator {
    sources: Vec<Arc<dyn SuggestionSource>>,
    layout: SuggestLayout,
    web_search_threshold: usize,
}

impl SuggestionAggregator {
    pub fn new(layout: SuggestLayout) -> Self {
        Self {
            sources: Vec::new(),
            layout,
            web_search_threshold: DEFAULT_WEB_SEARCH_THRESHOLD,
        }
    }

    pub fn with_web_search_threshold(mut self, threshold: usize) -> Self {
        self.web_search_threshold = threshold;
        self
    }

    /// Sources are consulted in registration order, which is also the order
    /// of items within one kind.
    pub fn register(&mut self, source: Arc<dyn SuggestionSource>) {
        tracing::debug!(source = source.name(), kind = %source.kind(), "Registered suggestion source");
        self.sources.push(source);
    }

    pub fn layout(&self) -> SuggestLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: SuggestLayout) {
        self.layout = layout;
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Run one query session for `prefix`.
    ///
    /// A failing source contributes nothing; the session itself never fails.
    pub async fn query(&self, prefix: &str, incognito: bool) -> MergedSuggestions {
        let prefix = prefix.trim();

        let active: Vec<&Arc<dyn SuggestionSource>> = self
            .sources
            .iter()
            .filter(|source| !prefix.is_empty() || source.wants_empty_query())
            .collect();
        if active.is_empty() {
            return MergedSuggestions::empty();
        }

        let results = join_all(active.iter().map(|source| {
            source.query(SuggestQuery {
                prefix: prefix.to_string(),
                limit: self.layout.budget(source.kind()),
                incognito,
            })
        }))
        .await;

        let mut merged = MergedSuggestions::empty();
        let mut remote_count = 0;
        for (source, result) in active.iter().zip(results) {
            let mut items = match result {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(source = source.name(), error = %err, "Suggestion source failed");
                    continue;
                }
            };
            items.truncate(self.layout.budget(source.kind()));
            if source.kind() == SuggestKind::RemoteSuggestion {
                remote_count += items.len();
            }
            for item in items {
                merged.push(item);
            }
        }

        if self.wants_web_search(prefix, remote_count) {
            merged.push(SuggestItem::web_search(prefix));
        }

        tracing::debug!(
            prefix_len = prefix.len(),
            results = merged.remaining(),
            "Suggestion query finished"
        );

        merged
    }

    fn wants_web_search(&self, prefix: &str, remote_count: usize) -> bool {
        let has_remote = self
            .sources
            .iter()
            .any(|source| source.kind() == SuggestKind::RemoteSuggestion);

        has_remote
            && !prefix.is_empty()
            && remote_count < self.web_search_threshold
            && remote_count < self.layout.budget(SuggestKind::RemoteSuggestion)
            && !looks_like_url(prefix)
    }
}
