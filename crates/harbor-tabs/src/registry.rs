//! Tab Registry
//!
//! Owns every tab exclusively. Not synchronized: a single owner (the
//! browser controller) mutates it.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::TabError;
use crate::persist::{RestoreOptions, SavedTabs};
use crate::surface::{PageSnapshot, SurfaceFactory};
use crate::tab::{Tab, TabId, TabSummary};
use crate::Result;

pub const DEFAULT_MAX_TABS: usize = 8;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub max_tabs: usize,
    /// Loaded into tabs whose saved state cannot be restored
    pub home_page: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_tabs: DEFAULT_MAX_TABS,
            home_page: "about:blank".to_string(),
        }
    }
}

/// Outcome of [`TabRegistry::reclaim_memory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reclamation {
    /// These tabs lost their render surfaces, least recently used first
    Released(Vec<TabId>),
    /// Nothing could be released; the current tab dropped its caches
    CachesDropped(TabId),
    /// No current tab
    Nothing,
}

pub struct TabRegistry {
    config: RegistryConfig,
    factory: Arc<dyn SurfaceFactory>,
    /// Creation order
    tabs: Vec<Tab>,
    /// Tabs holding a live surface, most recently activated last
    recency: VecDeque<TabId>,
    current: Option<TabId>,
    next_id: i64,
}

impl TabRegistry {
    pub fn new(config: RegistryConfig, factory: Arc<dyn SurfaceFactory>) -> Self {
        Self {
            config,
            factory,
            tabs: Vec::new(),
            recency: VecDeque::new(),
            current: None,
            next_id: 1,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn can_create_tab(&self) -> bool {
        self.tabs.len() < self.config.max_tabs
    }

    /// Create a background tab with a fresh render surface.
    pub fn create_tab(&mut self, incognito: bool) -> Result<TabId> {
        if !self.can_create_tab() {
            tracing::warn!(max_tabs = self.config.max_tabs, "Tab registry is full");
            return Err(TabError::RegistryFull {
                max: self.config.max_tabs,
            });
        }

        let id = TabId::from_raw(self.next_id);
        self.next_id += 1;

        let surface = self.factory.create_surface(incognito);
        self.tabs.push(Tab::new(id, incognito, surface));
        self.recency.push_back(id);

        tracing::info!(tab_id = %id, incognito, "Created new tab");

        Ok(id)
    }

    /// Create a tab opened from `parent`. Inherits the parent's incognito mode.
    pub fn create_child_tab(&mut self, parent: TabId) -> Result<TabId> {
        let incognito = self.tab(parent)?.is_incognito();
        let child = self.create_tab(incognito)?;
        self.link(parent, child);
        Ok(child)
    }

    pub fn remove_tab(&mut self, id: TabId) -> Result<()> {
        let index = self.position(id).ok_or(TabError::NotFound(id))?;
        let mut tab = self.tabs.remove(index);
        self.recency.retain(|t| *t != id);

        if self.current == Some(id) {
            tab.put_in_background()?;
            self.current = None;
        }

        if let Some(parent) = tab.parent() {
            if let Some(parent) = self.get_mut(parent) {
                parent.remove_child(id);
            }
        }
        for child in tab.children().to_vec() {
            if let Some(child) = self.get_mut(child) {
                child.set_parent(None);
            }
        }

        tab.destroy();

        tracing::info!(tab_id = %id, "Removed tab");

        Ok(())
    }

    /// Make `id` the foreground tab, materializing its surface if it was
    /// released.
    pub fn set_active_tab(&mut self, id: TabId) -> Result<()> {
        let index = self.position(id).ok_or(TabError::NotFound(id))?;
        if self.current == Some(id) {
            return Ok(());
        }

        if let Some(previous) = self.current.take() {
            if let Some(tab) = self.get_mut(previous) {
                tab.put_in_background()?;
            }
        }

        let tab = &mut self.tabs[index];
        if !tab.has_surface() {
            let surface = self.factory.create_surface(tab.is_incognito());
            tab.attach_surface(surface, &self.config.home_page)?;
            tracing::debug!(tab_id = %id, "Materialized released tab");
        }
        tab.put_in_foreground()?;

        self.recency.retain(|t| *t != id);
        self.recency.push_back(id);
        self.current = Some(id);

        Ok(())
    }

    /// Release the render surfaces of up to half of the live tabs, least
    /// recently used first, never touching the current tab or its parent.
    pub fn reclaim_memory(&mut self) -> Reclamation {
        let Some(current) = self.current else {
            return Reclamation::Nothing;
        };

        let victims = self.half_least_used(current);
        if victims.is_empty() {
            if let Some(tab) = self.get_mut(current) {
                if tab.free_surface_caches() {
                    tracing::debug!(tab_id = %current, "No tab to release, dropped caches");
                    return Reclamation::CachesDropped(current);
                }
            }
            return Reclamation::Nothing;
        }

        let mut released = Vec::with_capacity(victims.len());
        for id in victims {
            let Some(tab) = self.get_mut(id) else {
                continue;
            };
            match tab.release_surface() {
                Ok(()) => {
                    self.recency.retain(|t| *t != id);
                    released.push(id);
                }
                Err(err) => {
                    tracing::warn!(tab_id = %id, error = %err, "Could not release tab")
                }
            }
        }

        tracing::info!(released = released.len(), "Reclaimed tab memory");

        Reclamation::Released(released)
    }

    /// The least recently used live tab that may be recycled, if any.
    pub fn least_used_tab(&self) -> Option<TabId> {
        let current = self.current?;
        if self.tabs.len() <= 1 {
            return None;
        }
        let parent = self.get(current).and_then(Tab::parent);
        self.recency
            .iter()
            .copied()
            .find(|id| *id != current && Some(*id) != parent && self.has_live_surface(*id))
    }

    fn half_least_used(&self, current: TabId) -> Vec<TabId> {
        if self.tabs.len() <= 1 {
            return Vec::new();
        }

        let parent = self.get(current).and_then(Tab::parent);
        let live: Vec<TabId> = self
            .recency
            .iter()
            .copied()
            .filter(|id| self.has_live_surface(*id))
            .collect();
        let budget = live.len() / 2;

        live.into_iter()
            .filter(|id| *id != current && Some(*id) != parent)
            .take(budget)
            .collect()
    }

    fn has_live_surface(&self, id: TabId) -> bool {
        self.get(id).is_some_and(Tab::has_surface)
    }

    /// Snapshot every tab for persistence. `None` when there are no tabs.
    pub fn save_state(&mut self) -> Option<SavedTabs> {
        if self.tabs.is_empty() {
            return None;
        }

        let mut saved = SavedTabs {
            current: self.current,
            ..SavedTabs::default()
        };
        for tab in &mut self.tabs {
            let bundle = tab.save_state();
            saved.positions.push(tab.id());
            saved.tabs.insert(tab.id(), bundle);
        }

        tracing::debug!(tabs = saved.positions.len(), "Saved tab state");

        Some(saved)
    }

    pub fn can_restore(saved: &SavedTabs) -> bool {
        saved
            .positions
            .iter()
            .any(|id| saved.tabs.contains_key(id))
    }

    /// Rebuild the registry from saved state.
    ///
    /// Every saved tab comes back as a placeholder; only `target` (default:
    /// the saved foreground tab) gets a render surface unless
    /// `options.restore_all` is set. Parent links are resolved after all
    /// placeholders exist.
    pub fn restore_state(
        &mut self,
        saved: &SavedTabs,
        target: Option<TabId>,
        options: RestoreOptions,
    ) -> Result<()> {
        if !self.tabs.is_empty() {
            return Err(TabError::RestoreIntoPopulated);
        }

        let target = target.or(saved.current);
        if let Some(max_id) = saved.max_id() {
            self.next_id = self.next_id.max(max_id.as_i64() + 1);
        }

        for id in &saved.positions {
            let Some(bundle) = saved.tabs.get(id) else {
                tracing::warn!(tab_id = %id, "Saved tab without state, skipping");
                continue;
            };
            if bundle.incognito && !options.restore_incognito {
                continue;
            }
            if self.position(*id).is_some() {
                tracing::warn!(tab_id = %id, "Duplicate saved tab, skipping");
                continue;
            }
            if !self.can_create_tab() {
                tracing::warn!(max_tabs = self.config.max_tabs, "Restore stopped at tab limit");
                break;
            }

            let mut tab = Tab::placeholder(*id, bundle.clone());
            if options.restore_all || target == Some(*id) {
                let surface = self.factory.create_surface(bundle.incognito);
                tab.attach_surface(surface, &self.config.home_page)?;
                self.recency.push_back(*id);
            }
            self.tabs.push(tab);
        }

        for id in &saved.positions {
            let parent = saved.tabs.get(id).and_then(|bundle| bundle.parent);
            if let Some(parent) = parent {
                if parent != *id && self.position(parent).is_some() && self.position(*id).is_some()
                {
                    self.link(parent, *id);
                }
            }
        }

        tracing::info!(tabs = self.tabs.len(), "Restored tabs");

        match target {
            Some(target) if self.position(target).is_some() => self.set_active_tab(target),
            _ => Ok(()),
        }
    }

    /// Tear down every tab.
    pub fn destroy_all(&mut self) {
        for tab in &mut self.tabs {
            tab.destroy();
        }
        self.tabs.clear();
        self.recency.clear();
        self.current = None;
    }

    pub fn load_url(&mut self, id: TabId, url: &str) -> Result<()> {
        self.tab_mut(id)?.load_url(url)
    }

    /// Page events reported by the host while a tab loads.
    pub fn update_page(&mut self, id: TabId, url: &str, title: &str, progress: u8) -> Result<()> {
        self.tab_mut(id)?.update_page(PageSnapshot {
            url: url.to_string(),
            title: title.to_string(),
            progress: progress.min(100),
        });
        Ok(())
    }

    pub fn set_app_id(&mut self, id: TabId, app_id: Option<String>) -> Result<()> {
        self.tab_mut(id)?.set_app_id(app_id);
        Ok(())
    }

    fn link(&mut self, parent: TabId, child: TabId) {
        if let Some(old_parent) = self.get(child).and_then(Tab::parent) {
            if let Some(old_parent) = self.get_mut(old_parent) {
                old_parent.remove_child(child);
            }
        }
        if let Some(tab) = self.get_mut(parent) {
            tab.add_child(child);
        }
        if let Some(tab) = self.get_mut(child) {
            tab.set_parent(Some(parent));
        }
    }

    // === Lookups ===

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id() == id)
    }

    fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id() == id)
    }

    fn tab(&self, id: TabId) -> Result<&Tab> {
        self.get(id).ok_or(TabError::NotFound(id))
    }

    fn tab_mut(&mut self, id: TabId) -> Result<&mut Tab> {
        self.get_mut(id).ok_or(TabError::NotFound(id))
    }

    pub fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == id)
    }

    pub fn current_id(&self) -> Option<TabId> {
        self.current
    }

    pub fn current(&self) -> Option<&Tab> {
        self.current.and_then(|id| self.get(id))
    }

    /// Tabs in display (creation) order
    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn summaries(&self) -> Vec<TabSummary> {
        self.tabs.iter().map(Tab::summary).collect()
    }

    /// Live-surface tabs, least recently used first
    pub fn recency(&self) -> Vec<TabId> {
        self.recency.iter().copied().collect()
    }

    pub fn parent(&self, id: TabId) -> Option<TabId> {
        self.get(id).and_then(Tab::parent)
    }

    pub fn children(&self, id: TabId) -> &[TabId] {
        self.get(id).map(Tab::children).unwrap_or(&[])
    }

    pub fn find_by_url(&self, url: &str) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|t| t.page().url == url)
            .map(Tab::id)
    }

    pub fn find_by_app_id(&self, app_id: &str) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|t| t.app_id() == Some(app_id))
            .map(Tab::id)
    }

    pub fn has_incognito_tabs(&self) -> bool {
        self.tabs.iter().any(Tab::is_incognito)
    }
}
