//! Harbor Core
//!
//! Application context for the Harbor browser. All tab state is owned by a
//! single controller task; the UI talks to it through a handle and listens
//! on the event bus.

mod browser;
mod config;
mod controller;
mod error;
mod events;
mod intent;
mod state_store;

pub use browser::Harbor;
pub use config::Config;
pub use controller::{
    BrowserController, ControllerHandle, ControllerParts, PublishedSuggestions, SuggestionBoard,
    WidgetId,
};
pub use error::CoreError;
pub use events::{BrowserEvent, EventBus, Subscription};
pub use intent::{Intent, IntentOutcome};
pub use state_store::TabStateStore;

// Re-export core components
pub use harbor_provider::{
    BookmarkRow, BookmarkValues, BrowserProvider, BrowserUri, ContentValues, ProviderError,
    ProviderRows, SearchRow, SearchValues, Selection,
};
pub use harbor_storage::{Database, StorageError};
pub use harbor_suggest::{
    MergedSuggestions, SuggestError, SuggestExtra, SuggestItem, SuggestKind, SuggestLayout,
    SuggestionAggregator, SuggestionSource,
};
pub use harbor_tabs::{
    HeadlessFactory, PageSnapshot, Reclamation, RenderSurface, RestoreOptions, SavedTabs,
    SurfaceFactory, SurfaceState, TabError, TabId, TabRegistry, TabState, TabSummary,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
