//! Row and value shapes of the provider tables

use serde::{Deserialize, Serialize};

/// One row of the `bookmarks` table. Browsing history lives in the same
/// table with `bookmark == false` and a non-zero visit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRow {
    pub id: i64,
    pub title: Option<String>,
    pub url: String,
    pub visits: i64,
    /// Last visit, epoch millis
    pub date: i64,
    /// Creation time, epoch millis
    pub created: i64,
    pub description: Option<String>,
    pub bookmark: bool,
    pub favicon: Option<Vec<u8>>,
}

impl BookmarkRow {
    pub(crate) const COLUMNS: &'static [&'static str] = &[
        "_id",
        "title",
        "url",
        "visits",
        "date",
        "created",
        "description",
        "bookmark",
        "favicon",
    ];

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            visits: row.get(3)?,
            date: row.get(4)?,
            created: row.get(5)?,
            description: row.get(6)?,
            bookmark: row.get::<_, i64>(7)? != 0,
            favicon: row.get(8)?,
        })
    }

    /// Title for display, falling back to the URL
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.url,
        }
    }
}

/// One row of the `searches` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRow {
    pub id: i64,
    pub search: String,
    pub date: i64,
}

impl SearchRow {
    pub(crate) const COLUMNS: &'static [&'static str] = &["_id", "search", "date"];

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            search: row.get(1)?,
            date: row.get(2)?,
        })
    }
}

/// Result of a provider query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRows {
    Bookmarks(Vec<BookmarkRow>),
    Searches(Vec<SearchRow>),
}

impl ProviderRows {
    pub fn len(&self) -> usize {
        match self {
            ProviderRows::Bookmarks(rows) => rows.len(),
            ProviderRows::Searches(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bookmarks(self) -> Vec<BookmarkRow> {
        match self {
            ProviderRows::Bookmarks(rows) => rows,
            ProviderRows::Searches(_) => Vec::new(),
        }
    }

    pub fn into_searches(self) -> Vec<SearchRow> {
        match self {
            ProviderRows::Searches(rows) => rows,
            ProviderRows::Bookmarks(_) => Vec::new(),
        }
    }
}

/// Column values for insert/update on `bookmarks`. Unset fields are left
/// alone on update and defaulted on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkValues {
    pub title: Option<String>,
    pub url: Option<String>,
    pub visits: Option<i64>,
    pub date: Option<i64>,
    pub created: Option<i64>,
    pub description: Option<String>,
    pub bookmark: Option<bool>,
    pub favicon: Option<Vec<u8>>,
}

impl BookmarkValues {
    pub fn bookmark(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
            bookmark: Some(true),
            ..Default::default()
        }
    }

    pub(crate) fn assignments(&self) -> Vec<(&'static str, rusqlite::types::Value)> {
        use rusqlite::types::Value;

        let mut out = Vec::new();
        if let Some(title) = &self.title {
            out.push(("title", Value::Text(title.clone())));
        }
        if let Some(url) = &self.url {
            out.push(("url", Value::Text(url.clone())));
        }
        if let Some(visits) = self.visits {
            out.push(("visits", Value::Integer(visits)));
        }
        if let Some(date) = self.date {
            out.push(("date", Value::Integer(date)));
        }
        if let Some(created) = self.created {
            out.push(("created", Value::Integer(created)));
        }
        if let Some(description) = &self.description {
            out.push(("description", Value::Text(description.clone())));
        }
        if let Some(bookmark) = self.bookmark {
            out.push(("bookmark", Value::Integer(bookmark as i64)));
        }
        if let Some(favicon) = &self.favicon {
            out.push(("favicon", Value::Blob(favicon.clone())));
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchValues {
    pub search: Option<String>,
    pub date: Option<i64>,
}

impl SearchValues {
    pub(crate) fn assignments(&self) -> Vec<(&'static str, rusqlite::types::Value)> {
        use rusqlite::types::Value;

        let mut out = Vec::new();
        if let Some(search) = &self.search {
            out.push(("search", Value::Text(search.clone())));
        }
        if let Some(date) = self.date {
            out.push(("date", Value::Integer(date)));
        }
        out
    }
}

/// Values for the insert/update verbs, tagged by table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentValues {
    Bookmark(BookmarkValues),
    Search(SearchValues),
}

impl From<BookmarkValues> for ContentValues {
    fn from(values: BookmarkValues) -> Self {
        ContentValues::Bookmark(values)
    }
}

impl From<SearchValues> for ContentValues {
    fn from(values: SearchValues) -> Self {
        ContentValues::Search(values)
    }
}
