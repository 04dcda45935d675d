//! Render surface seam
//!
//! The rendering engine is supplied by the host. The registry only needs to
//! create surfaces, ask them to save and restore their state, drop caches
//! and tear them down.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::SurfaceError;

/// Opaque serialized state of a render surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceState(pub Vec<u8>);

/// What a tab is currently showing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    /// Load progress, 0..=100
    pub progress: u8,
}

impl PageSnapshot {
    pub fn loading(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            progress: 0,
        }
    }
}

pub trait RenderSurface: Send {
    fn load_url(&mut self, url: &str);

    fn current_page(&self) -> PageSnapshot;

    /// The host reported navigation progress for this surface.
    fn page_updated(&mut self, _page: &PageSnapshot) {}

    /// `None` when there is nothing worth saving (blank surface).
    fn save_state(&self) -> Option<SurfaceState>;

    fn restore_state(&mut self, state: &SurfaceState) -> Result<(), SurfaceError>;

    /// Called when the tab moves to the foreground.
    fn resume(&mut self) {}

    /// Called when the tab moves to the background.
    fn pause(&mut self) {}

    /// Drop internal caches without losing the page.
    fn free_memory(&mut self);

    fn destroy(&mut self);
}

pub trait SurfaceFactory: Send + Sync {
    fn create_surface(&self, incognito: bool) -> Box<dyn RenderSurface>;
}

/// Counters shared by a [`HeadlessFactory`] and every surface it creates.
#[derive(Debug, Default)]
struct SurfaceStats {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    caches_dropped: AtomicUsize,
}

/// A render surface that keeps only the current page. Used when no engine is
/// attached (headless runs, tests); its saved state is the JSON page snapshot.
pub struct HeadlessSurface {
    page: PageSnapshot,
    stats: Arc<SurfaceStats>,
}

impl RenderSurface for HeadlessSurface {
    fn load_url(&mut self, url: &str) {
        self.page = PageSnapshot {
            url: url.to_string(),
            title: String::new(),
            progress: 100,
        };
    }

    fn current_page(&self) -> PageSnapshot {
        self.page.clone()
    }

    fn page_updated(&mut self, page: &PageSnapshot) {
        self.page = page.clone();
    }

    fn save_state(&self) -> Option<SurfaceState> {
        if self.page.url.is_empty() {
            return None;
        }
        serde_json::to_vec(&self.page).ok().map(SurfaceState)
    }

    fn restore_state(&mut self, state: &SurfaceState) -> Result<(), SurfaceError> {
        let page: PageSnapshot =
            serde_json::from_slice(&state.0).map_err(|e| SurfaceError(e.to_string()))?;
        self.page = page;
        Ok(())
    }

    fn free_memory(&mut self) {
        self.stats.caches_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn destroy(&mut self) {
        self.stats.destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Clone, Default)]
pub struct HeadlessFactory {
    stats: Arc<SurfaceStats>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.stats.created.load(Ordering::Relaxed)
    }

    pub fn destroyed(&self) -> usize {
        self.stats.destroyed.load(Ordering::Relaxed)
    }

    pub fn caches_dropped(&self) -> usize {
        self.stats.caches_dropped.load(Ordering::Relaxed)
    }

    /// Surfaces created and not yet destroyed
    pub fn live(&self) -> usize {
        self.created().saturating_sub(self.destroyed())
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create_surface(&self, _incognito: bool) -> Box<dyn RenderSurface> {
        self.stats.created.fetch_add(1, Ordering::Relaxed);
        Box::new(HeadlessSurface {
            page: PageSnapshot::default(),
            stats: Arc::clone(&self.stats),
        })
    }
}
