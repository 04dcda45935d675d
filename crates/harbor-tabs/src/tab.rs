//! Tab data structure

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TabError;
use crate::persist::TabBundle;
use crate::state::TabState;
use crate::surface::{PageSnapshot, RenderSurface};
use crate::Result;

/// Process-unique tab identifier. Assigned from a strictly increasing counter
/// and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(i64);

impl TabId {
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct Tab {
    id: TabId,
    state: TabState,
    parent: Option<TabId>,
    children: Vec<TabId>,
    surface: Option<Box<dyn RenderSurface>>,
    /// Last saved state; the only state a discarded tab has
    saved: Option<TabBundle>,
    incognito: bool,
    app_id: Option<String>,
    page: PageSnapshot,
    /// `page` came from the host and wins over the surface until the next load
    page_reported: bool,
}

/// Read-only view of a tab for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSummary {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub state: TabState,
    pub incognito: bool,
    pub parent: Option<TabId>,
    pub has_surface: bool,
}

impl Tab {
    pub(crate) fn new(id: TabId, incognito: bool, surface: Box<dyn RenderSurface>) -> Self {
        Self {
            id,
            state: TabState::Background,
            parent: None,
            children: Vec::new(),
            surface: Some(surface),
            saved: None,
            incognito,
            app_id: None,
            page: PageSnapshot::default(),
            page_reported: false,
        }
    }

    /// A restored tab without a render surface.
    pub(crate) fn placeholder(id: TabId, bundle: TabBundle) -> Self {
        Self {
            id,
            state: TabState::Discarded,
            // Parent links are re-established once every placeholder exists
            parent: None,
            children: Vec::new(),
            surface: None,
            incognito: bundle.incognito,
            app_id: bundle.app_id.clone(),
            page: PageSnapshot {
                url: bundle.url.clone(),
                title: bundle.title.clone(),
                progress: 0,
            },
            page_reported: false,
            saved: Some(bundle),
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn state(&self) -> TabState {
        self.state
    }

    pub fn is_foreground(&self) -> bool {
        self.state.is_foreground()
    }

    pub fn is_incognito(&self) -> bool {
        self.incognito
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn parent(&self) -> Option<TabId> {
        self.parent
    }

    pub fn children(&self) -> &[TabId] {
        &self.children
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn saved_state(&self) -> Option<&TabBundle> {
        self.saved.as_ref()
    }

    /// Current page. The last host report wins; otherwise it is read
    /// through the live surface when there is one.
    pub fn page(&self) -> PageSnapshot {
        if self.page_reported {
            return self.page.clone();
        }
        match &self.surface {
            Some(surface) => {
                let live = surface.current_page();
                if live.url.is_empty() {
                    self.page.clone()
                } else {
                    live
                }
            }
            None => self.page.clone(),
        }
    }

    /// Title for display, falling back to the URL
    pub fn display_title(&self) -> String {
        let page = self.page();
        if page.title.is_empty() {
            page.url
        } else {
            page.title
        }
    }

    pub fn summary(&self) -> TabSummary {
        let page = self.page();
        TabSummary {
            id: self.id,
            url: page.url,
            title: page.title,
            state: self.state,
            incognito: self.incognito,
            parent: self.parent,
            has_surface: self.has_surface(),
        }
    }

    /// Attempt to transition to a new state
    pub(crate) fn transition_to(&mut self, new_state: TabState) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(TabError::InvalidTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        if self.state != new_state {
            tracing::debug!(
                tab_id = %self.id,
                from = %self.state,
                to = %new_state,
                "Tab state transition"
            );
        }

        self.state = new_state;
        Ok(())
    }

    pub(crate) fn put_in_foreground(&mut self) -> Result<()> {
        self.transition_to(TabState::Active)?;
        if let Some(surface) = self.surface.as_mut() {
            surface.resume();
        }
        Ok(())
    }

    /// Move to the background, keeping the volatile page state (title,
    /// progress) for the tab switcher.
    pub(crate) fn put_in_background(&mut self) -> Result<()> {
        if self.state != TabState::Active {
            return Ok(());
        }
        if let Some(surface) = self.surface.as_mut() {
            if !self.page_reported {
                self.page = surface.current_page();
            }
            surface.pause();
        }
        self.transition_to(TabState::Background)
    }

    pub(crate) fn set_parent(&mut self, parent: Option<TabId>) {
        self.parent = parent;
        if let Some(saved) = self.saved.as_mut() {
            saved.parent = parent;
        }
    }

    pub(crate) fn add_child(&mut self, child: TabId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: TabId) {
        self.children.retain(|id| *id != child);
    }

    pub(crate) fn set_app_id(&mut self, app_id: Option<String>) {
        self.app_id = app_id.clone();
        if let Some(saved) = self.saved.as_mut() {
            saved.app_id = app_id;
        }
    }

    pub(crate) fn update_page(&mut self, page: PageSnapshot) {
        if let Some(surface) = self.surface.as_mut() {
            surface.page_updated(&page);
        }
        self.page = page;
        self.page_reported = true;
    }

    pub(crate) fn load_url(&mut self, url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(TabError::InvalidUrl("URL cannot be empty".to_string()));
        }

        self.page = PageSnapshot::loading(url);
        self.page_reported = false;
        match self.surface.as_mut() {
            Some(surface) => surface.load_url(url),
            None => {
                // Loaded when the tab is materialized again
                let saved = self.saved.get_or_insert_with(TabBundle::default);
                saved.url = url.to_string();
                saved.title.clear();
                saved.surface_state = None;
            }
        }
        Ok(())
    }

    /// Capture the tab's state into its bundle and return a copy.
    pub(crate) fn save_state(&mut self) -> TabBundle {
        let previous = self.saved.take().unwrap_or_default();
        let (page, surface_state) = match &self.surface {
            Some(surface) => (self.page(), surface.save_state()),
            None => (self.page.clone(), previous.surface_state),
        };

        let bundle = TabBundle {
            url: page.url,
            title: page.title,
            surface_state,
            parent: self.parent,
            app_id: self.app_id.clone(),
            incognito: self.incognito,
        };
        self.saved = Some(bundle.clone());
        bundle
    }

    /// Save state, then tear down the render surface. The tab stays in the
    /// registry as a placeholder.
    pub(crate) fn release_surface(&mut self) -> Result<()> {
        if !self.state.can_transition_to(TabState::Discarded) {
            return Err(TabError::InvalidTransition {
                from: self.state.to_string(),
                to: TabState::Discarded.to_string(),
            });
        }

        self.save_state();
        self.page = self.page();
        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
        }
        self.transition_to(TabState::Discarded)
    }

    /// Give a placeholder a fresh surface, restoring saved state into it.
    /// A surface that cannot be restored shows `home_page` instead.
    pub(crate) fn attach_surface(
        &mut self,
        mut surface: Box<dyn RenderSurface>,
        home_page: &str,
    ) -> Result<()> {
        let saved = self.saved.as_ref();
        match saved.and_then(|bundle| bundle.surface_state.as_ref()) {
            Some(state) => {
                if let Err(err) = surface.restore_state(state) {
                    tracing::warn!(
                        tab_id = %self.id,
                        error = %err,
                        "Failed to restore tab, loading home page"
                    );
                    surface.load_url(home_page);
                    self.page = PageSnapshot::loading(home_page);
                }
            }
            None => {
                let url = saved
                    .map(|bundle| bundle.url.as_str())
                    .filter(|url| !url.is_empty())
                    .unwrap_or(home_page)
                    .to_string();
                surface.load_url(&url);
                self.page = PageSnapshot::loading(url);
            }
        }

        self.surface = Some(surface);
        self.page_reported = false;
        if self.state == TabState::Discarded {
            self.transition_to(TabState::Background)?;
        }
        Ok(())
    }

    pub(crate) fn free_surface_caches(&mut self) -> bool {
        match self.surface.as_mut() {
            Some(surface) => {
                surface.free_memory();
                true
            }
            None => false,
        }
    }

    pub(crate) fn destroy(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
        }
    }
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("has_surface", &self.surface.is_some())
            .field("incognito", &self.incognito)
            .field("app_id", &self.app_id)
            .field("page", &self.page)
            .field("page_reported", &self.page_reported)
            .finish()
    }
}
