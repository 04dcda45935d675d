//! External requests to open content

use serde::{Deserialize, Serialize};

use harbor_provider::BookmarkRow;
use harbor_tabs::TabId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    /// Open a new foreground tab, on the home page when `url` is unset
    NewTab { url: Option<String> },
    /// Show a URL on behalf of an app. A tab already bound to `app_id` is
    /// reused.
    ViewUrl { url: String, app_id: Option<String> },
    /// Run a web search in the current tab and remember the query
    Search { query: String },
    ShowBookmarks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Tab(TabId),
    Bookmarks(Vec<BookmarkRow>),
}

impl IntentOutcome {
    pub fn tab(&self) -> Option<TabId> {
        match self {
            IntentOutcome::Tab(id) => Some(*id),
            IntentOutcome::Bookmarks(_) => None,
        }
    }
}
