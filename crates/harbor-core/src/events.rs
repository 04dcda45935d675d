//! Browser event bus
//!
//! Listeners register explicitly and stay registered for as long as they
//! hold their [`Subscription`].

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use harbor_tabs::TabId;

use crate::controller::WidgetId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    TabCreated(TabId),
    TabRemoved(TabId),
    TabActivated(TabId),
    /// Render surfaces released under memory pressure
    TabsReclaimed(Vec<TabId>),
    /// A tab could not be opened; the UI shows a warning
    TabLimitReached { max: usize },
    TabsRestored { count: usize },
    SuggestionsPublished { widget: WidgetId, generation: u64 },
}

type Listener = Arc<dyn Fn(&BrowserEvent) + Send + Sync>;
type Listeners = RwLock<Vec<(u64, Listener)>>;

pub struct EventBus {
    listeners: Arc<Listeners>,
    next_id: Arc<AtomicU64>,
}

/// Keeps a listener registered. Dropping it removes the listener.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&BrowserEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn emit(&self, event: BrowserEvent) {
        // Listeners may subscribe or unsubscribe from inside a callback
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::trace!(?event, listeners = snapshot.len(), "Emitting browser event");

        for listener in snapshot {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.write().retain(|(id, _)| *id != self.id);
        }
    }
}
