//! Harbor Tab Registry
//!
//! Tabs are ordered by creation and tracked in a separate recency queue
//! that drives memory reclamation. A tab may lose its render surface under
//! memory pressure and is then kept as a lightweight placeholder until it
//! is activated again.

mod error;
mod persist;
mod registry;
mod state;
mod surface;
mod tab;

pub use error::{SurfaceError, TabError};
pub use persist::{RestoreOptions, SavedTabs, TabBundle};
pub use registry::{Reclamation, RegistryConfig, TabRegistry, DEFAULT_MAX_TABS};
pub use state::TabState;
pub use surface::{
    HeadlessFactory, HeadlessSurface, PageSnapshot, RenderSurface, SurfaceFactory, SurfaceState,
};
pub use tab::{Tab, TabId, TabSummary};

pub type Result<T> = std::result::Result<T, TabError>;
