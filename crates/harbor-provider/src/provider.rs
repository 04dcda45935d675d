//! Browser content provider
//!
//! CRUD verbs over `content://browser/...` plus the bookkeeping helpers the
//! browser UI calls when pages are visited and searches are issued.

use rusqlite::types::Value;

use harbor_storage::{now_millis, Database};

use crate::error::ProviderError;
use crate::rows::{BookmarkRow, ContentValues, ProviderRows, SearchRow};
use crate::uri::BrowserUri;
use crate::Result;

/// Rows returned by a suggest URI without an explicit `limit`.
const DEFAULT_SUGGEST_LIMIT: u32 = 20;

const SUGGEST_SELECTION: &str =
    "url LIKE ? OR url LIKE ? OR url LIKE ? OR url LIKE ? OR title LIKE ?";

/// A `WHERE` fragment with positional `?` arguments, as handed to the
/// provider by its callers.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    clause: Option<String>,
    args: Vec<Value>,
    limit: Option<u32>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: Some(clause.into()),
            ..Self::default()
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Bookmarks,
    Searches,
}

impl Table {
    fn for_uri(uri: &BrowserUri) -> Option<Self> {
        match uri {
            BrowserUri::Bookmarks | BrowserUri::Bookmark(_) => Some(Table::Bookmarks),
            BrowserUri::Searches | BrowserUri::Search(_) => Some(Table::Searches),
            BrowserUri::Suggest { .. } => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Table::Bookmarks => "bookmarks",
            Table::Searches => "searches",
        }
    }

    fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Bookmarks => BookmarkRow::COLUMNS,
            Table::Searches => SearchRow::COLUMNS,
        }
    }
}

pub struct BrowserProvider {
    db: Database,
}

impl BrowserProvider {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Type discovery
    pub fn get_type(&self, uri: &str) -> Result<&'static str> {
        Ok(uri.parse::<BrowserUri>()?.mime_type())
    }

    pub fn query(
        &self,
        uri: &BrowserUri,
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> Result<ProviderRows> {
        if let BrowserUri::Suggest { query, limit } = uri {
            let rows = self.suggest(query, limit.unwrap_or(DEFAULT_SUGGEST_LIMIT))?;
            return Ok(ProviderRows::Bookmarks(rows));
        }

        let table = table_for(uri)?;
        let (where_sql, mut args) = where_clause(uri, selection);
        let order_sql = match sort_order {
            Some(order) => format!(" ORDER BY {}", validate_sort_order(table, order)?),
            None => String::new(),
        };
        let limit_sql = match selection.limit {
            Some(limit) => {
                args.push(Value::Integer(i64::from(limit)));
                " LIMIT ?"
            }
            None => "",
        };

        let sql = format!(
            "SELECT {} FROM {}{}{}{}",
            table.columns().join(", "),
            table.name(),
            where_sql,
            order_sql,
            limit_sql
        );

        let rows = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let params = rusqlite::params_from_iter(args.iter());
            let rows = match table {
                Table::Bookmarks => ProviderRows::Bookmarks(
                    stmt.query_map(params, BookmarkRow::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?,
                ),
                Table::Searches => ProviderRows::Searches(
                    stmt.query_map(params, SearchRow::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?,
                ),
            };
            Ok(rows)
        })?;

        Ok(rows)
    }

    /// Insert a row; returns the item URI of the new row.
    pub fn insert(&self, uri: &BrowserUri, values: ContentValues) -> Result<BrowserUri> {
        if uri.is_item() {
            return Err(ProviderError::IllegalArgument(format!(
                "cannot insert into item URI {uri}"
            )));
        }
        let table = table_for(uri)?;

        let mut assignments = match (table, values) {
            (Table::Bookmarks, ContentValues::Bookmark(values)) => {
                if values.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                    return Err(ProviderError::IllegalArgument(
                        "bookmark insert requires a url".to_string(),
                    ));
                }
                let mut assignments = values.assignments();
                if values.created.is_none() {
                    assignments.push(("created", Value::Integer(now_millis())));
                }
                assignments
            }
            (Table::Searches, ContentValues::Search(values)) => {
                if values.search.as_deref().map_or(true, |s| s.trim().is_empty()) {
                    return Err(ProviderError::IllegalArgument(
                        "search insert requires search text".to_string(),
                    ));
                }
                let mut assignments = values.assignments();
                if values.date.is_none() {
                    assignments.push(("date", Value::Integer(now_millis())));
                }
                assignments
            }
            _ => {
                return Err(ProviderError::IllegalArgument(format!(
                    "values do not match {uri}"
                )))
            }
        };

        let columns: Vec<&str> = assignments.iter().map(|(c, _)| *c).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            placeholders
        );
        let params: Vec<Value> = assignments.drain(..).map(|(_, v)| v).collect();

        let id = self.db.with_connection(|conn| {
            conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::debug!(table = table.name(), row_id = id, "Inserted row");

        Ok(match table {
            Table::Bookmarks => BrowserUri::Bookmark(id),
            Table::Searches => BrowserUri::Search(id),
        })
    }

    /// Update matching rows; returns the number of rows changed.
    pub fn update(
        &self,
        uri: &BrowserUri,
        values: ContentValues,
        selection: &Selection,
    ) -> Result<usize> {
        let table = table_for(uri)?;
        let assignments = match (table, values) {
            (Table::Bookmarks, ContentValues::Bookmark(values)) => values.assignments(),
            (Table::Searches, ContentValues::Search(values)) => values.assignments(),
            _ => {
                return Err(ProviderError::IllegalArgument(format!(
                    "values do not match {uri}"
                )))
            }
        };
        if assignments.is_empty() {
            return Err(ProviderError::IllegalArgument(
                "update without values".to_string(),
            ));
        }

        let set_sql = assignments
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let (where_sql, where_args) = where_clause(uri, selection);
        let sql = format!("UPDATE {} SET {}{}", table.name(), set_sql, where_sql);

        let mut params: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
        params.extend(where_args);

        let changed = self.db.with_connection(|conn| {
            Ok(conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?)
        })?;

        Ok(changed)
    }

    /// Delete matching rows; returns the number of rows removed.
    pub fn delete(&self, uri: &BrowserUri, selection: &Selection) -> Result<usize> {
        let table = table_for(uri)?;
        let (where_sql, args) = where_clause(uri, selection);
        let sql = format!("DELETE FROM {}{}", table.name(), where_sql);

        let removed = self.db.with_connection(|conn| {
            Ok(conn.execute(&sql, rusqlite::params_from_iter(args.iter()))?)
        })?;

        tracing::debug!(table = table.name(), removed, "Deleted rows");

        Ok(removed)
    }

    /// All bookmarks, newest first
    pub fn bookmarks(&self) -> Result<Vec<BookmarkRow>> {
        Ok(self
            .query(
                &BrowserUri::Bookmarks,
                &Selection::new("bookmark = 1"),
                Some("created DESC"),
            )?
            .into_bookmarks())
    }

    /// Record a page visit: bump visits and date of an existing row, or add
    /// a history row.
    pub fn update_visited_history(&self, url: &str, title: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Ok(());
        }

        let now = now_millis();
        self.db.transaction(|conn| {
            let changed = conn.execute(
                "UPDATE bookmarks
                 SET visits = visits + 1,
                     date = ?1,
                     title = CASE WHEN ?2 != '' THEN ?2 ELSE title END
                 WHERE url = ?3",
                rusqlite::params![now, title, url],
            )?;

            if changed == 0 {
                conn.execute(
                    "INSERT INTO bookmarks (url, title, visits, date, created, bookmark)
                     VALUES (?1, ?2, 1, ?3, 0, 0)",
                    rusqlite::params![url, title, now],
                )?;
            }
            Ok(())
        })?;

        Ok(())
    }

    /// Save a search, refreshing its date if it already exists
    pub fn record_search(&self, search: &str) -> Result<()> {
        let search = search.trim();
        if search.is_empty() {
            return Ok(());
        }

        let now = now_millis();
        self.db.transaction(|conn| {
            let changed = conn.execute(
                "UPDATE searches SET date = ?1 WHERE search = ?2",
                rusqlite::params![now, search],
            )?;
            if changed == 0 {
                conn.execute(
                    "INSERT INTO searches (search, date) VALUES (?1, ?2)",
                    rusqlite::params![search, now],
                )?;
            }
            Ok(())
        })?;

        Ok(())
    }

    /// Keep at most `max` history-only rows, dropping the oldest visits.
    /// Returns the number of rows removed.
    pub fn truncate_history(&self, max: usize) -> Result<usize> {
        let removed = self.db.with_connection(|conn| {
            Ok(conn.execute(
                "DELETE FROM bookmarks WHERE _id IN (
                     SELECT _id FROM bookmarks WHERE bookmark = 0
                     ORDER BY date DESC LIMIT -1 OFFSET ?1
                 )",
                [max as i64],
            )?)
        })?;

        if removed > 0 {
            tracing::info!(removed, "Truncated browsing history");
        }

        Ok(removed)
    }

    /// Forget browsing history. Bookmarks survive with their visit data reset.
    pub fn clear_history(&self) -> Result<()> {
        self.db.transaction(|conn| {
            conn.execute("DELETE FROM bookmarks WHERE bookmark = 0", [])?;
            conn.execute(
                "UPDATE bookmarks SET visits = 0, date = 0 WHERE bookmark = 1",
                [],
            )?;
            Ok(())
        })?;

        tracing::info!("Cleared browsing history");

        Ok(())
    }

    pub fn clear_searches(&self) -> Result<usize> {
        self.delete(&BrowserUri::Searches, &Selection::all())
    }

    fn suggest(&self, prefix: &str, limit: u32) -> Result<Vec<BookmarkRow>> {
        if prefix.trim().is_empty() {
            return Ok(Vec::new());
        }

        let like = format!("{prefix}%");
        let (clause, mut args): (&str, Vec<Value>) =
            if prefix.starts_with("http") || prefix.starts_with("file") {
                ("url LIKE ?", vec![Value::Text(like)])
            } else {
                (
                    SUGGEST_SELECTION,
                    vec![
                        Value::Text(format!("http://{like}")),
                        Value::Text(format!("http://www.{like}")),
                        Value::Text(format!("https://{like}")),
                        Value::Text(format!("https://www.{like}")),
                        Value::Text(format!("%{like}")),
                    ],
                )
            };
        args.push(Value::Integer(i64::from(limit)));

        let sql = format!(
            "SELECT {} FROM bookmarks
             WHERE ({clause}) AND (bookmark = 1 OR visits > 0)
             ORDER BY visits DESC, date DESC
             LIMIT ?",
            BookmarkRow::COLUMNS.join(", ")
        );

        let rows = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(args.iter()), BookmarkRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        Ok(rows)
    }
}

impl Clone for BrowserProvider {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

fn table_for(uri: &BrowserUri) -> Result<Table> {
    Table::for_uri(uri).ok_or_else(|| {
        ProviderError::IllegalArgument(format!("operation not supported on {uri}"))
    })
}

fn where_clause(uri: &BrowserUri, selection: &Selection) -> (String, Vec<Value>) {
    let mut args = Vec::new();
    let mut parts = Vec::new();

    if let Some(id) = uri.row_id() {
        parts.push("_id = ?".to_string());
        args.push(Value::Integer(id));
    }
    if let Some(clause) = selection.clause.as_deref().filter(|c| !c.trim().is_empty()) {
        parts.push(format!("({clause})"));
        args.extend(selection.args.iter().cloned());
    }

    if parts.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", parts.join(" AND ")), args)
    }
}

/// Accepts `column [ASC|DESC]` terms naming the table's own columns.
fn validate_sort_order(table: Table, order: &str) -> Result<String> {
    let mut terms = Vec::new();
    for term in order.split(',') {
        let mut words = term.split_whitespace();
        let column = words.next().unwrap_or_default();
        if !table.columns().contains(&column) {
            return Err(ProviderError::IllegalArgument(format!(
                "bad sort order: {order}"
            )));
        }
        let direction = match words.next().map(str::to_ascii_uppercase).as_deref() {
            None => "ASC",
            Some("ASC") => "ASC",
            Some("DESC") => "DESC",
            Some(_) => {
                return Err(ProviderError::IllegalArgument(format!(
                    "bad sort order: {order}"
                )))
            }
        };
        if words.next().is_some() {
            return Err(ProviderError::IllegalArgument(format!(
                "bad sort order: {order}"
            )));
        }
        terms.push(format!("{column} {direction}"));
    }
    Ok(terms.join(", "))
}
