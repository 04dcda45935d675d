//! Ordered merge of suggestion contributions

use std::collections::VecDeque;

use crate::item::{SuggestItem, SuggestKind};

const BUCKETS: usize = SuggestKind::ALL.len();

/// Suggestions grouped by kind priority, stable within a kind.
///
/// Forward-only: items are moved out as they are yielded and the iterator
/// cannot be rewound.
#[derive(Debug, Default)]
pub struct MergedSuggestions {
    buckets: [VecDeque<SuggestItem>; BUCKETS],
    cursor: usize,
}

impl MergedSuggestions {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Items are bucketed by kind; within a bucket, insertion order is kept.
    pub(crate) fn push(&mut self, item: SuggestItem) {
        self.buckets[item.kind.priority()].push_back(item);
    }

    pub fn remaining(&self) -> usize {
        self.buckets[self.cursor.min(BUCKETS)..]
            .iter()
            .map(VecDeque::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of remaining items of one kind
    pub fn count_of(&self, kind: SuggestKind) -> usize {
        self.buckets[kind.priority()].len()
    }
}

impl FromIterator<SuggestItem> for MergedSuggestions {
    fn from_iter<I: IntoIterator<Item = SuggestItem>>(iter: I) -> Self {
        let mut merged = Self::default();
        for item in iter {
            merged.push(item);
        }
        merged
    }
}

impl Iterator for MergedSuggestions {
    type Item = SuggestItem;

    fn next(&mut self) -> Option<SuggestItem> {
        while self.cursor < BUCKETS {
            if let Some(item) = self.buckets[self.cursor].pop_front() {
                return Some(item);
            }
            self.cursor += 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MergedSuggestions {}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: SuggestKind, title: &str) -> SuggestItem {
        SuggestItem::new(kind, title, None)
    }

    #[test]
    fn test_grouped_and_stable() {
        let merged: MergedSuggestions = vec![
            item(SuggestKind::BrowsingHistory, "h1"),
            item(SuggestKind::Bookmark, "b1"),
            item(SuggestKind::SearchHistory, "s1"),
            item(SuggestKind::Bookmark, "b2"),
            item(SuggestKind::RemoteSuggestion, "r1"),
            item(SuggestKind::BrowsingHistory, "h2"),
            item(SuggestKind::SearchHistory, "s2"),
        ]
        .into_iter()
        .collect();

        assert_eq!(merged.len(), 7);
        let titles: Vec<String> = merged.map(|i| i.title).collect();
        assert_eq!(titles, vec!["s1", "s2", "r1", "b1", "b2", "h1", "h2"]);
    }

    #[test]
    fn test_forward_only() {
        let mut merged: MergedSuggestions = vec![
            item(SuggestKind::SuggestedUrl, "u"),
            item(SuggestKind::SearchHistory, "s"),
        ]
        .into_iter()
        .collect();

        assert_eq!(merged.next().unwrap().title, "s");
        assert_eq!(merged.remaining(), 1);
        assert_eq!(merged.next().unwrap().title, "u");
        assert!(merged.next().is_none());
        assert!(merged.next().is_none());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_empty() {
        let mut merged = MergedSuggestions::empty();
        assert_eq!(merged.len(), 0);
        assert!(merged.next().is_none());
    }
}
