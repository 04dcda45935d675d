//! Persisted tab-state layout
//!
//! Parallel list of tab ids in display order, one bundle per id, and the id
//! of the foreground tab. Survives process death as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::surface::SurfaceState;
use crate::tab::TabId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabBundle {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub surface_state: Option<SurfaceState>,
    #[serde(default)]
    pub parent: Option<TabId>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub incognito: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTabs {
    pub positions: Vec<TabId>,
    pub tabs: BTreeMap<TabId, TabBundle>,
    pub current: Option<TabId>,
}

impl SavedTabs {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Largest id mentioned anywhere in the saved state
    pub fn max_id(&self) -> Option<TabId> {
        self.positions
            .iter()
            .chain(self.tabs.keys())
            .chain(self.current.iter())
            .copied()
            .max()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Materialize a render surface for every tab, not just the target
    pub restore_all: bool,
    /// Bring back incognito tabs (normally dropped on restore)
    pub restore_incognito: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_layout() {
        let mut saved = SavedTabs::default();
        saved.positions = vec![TabId::from_raw(3), TabId::from_raw(1)];
        saved.tabs.insert(
            TabId::from_raw(3),
            TabBundle {
                url: "https://example.com".to_string(),
                parent: Some(TabId::from_raw(1)),
                ..Default::default()
            },
        );
        saved.tabs.insert(
            TabId::from_raw(1),
            TabBundle {
                url: "https://rust-lang.org".to_string(),
                incognito: true,
                ..Default::default()
            },
        );
        saved.current = Some(TabId::from_raw(1));

        let json = saved.to_json().unwrap();
        assert!(json.contains("\"positions\":[3,1]"));
        assert_eq!(SavedTabs::from_json(&json).unwrap(), saved);
        assert_eq!(saved.max_id(), Some(TabId::from_raw(3)));
    }

    #[test]
    fn test_missing_optional_fields() {
        let saved =
            SavedTabs::from_json(r#"{"positions":[5],"tabs":{"5":{"url":"about:blank"}},"current":5}"#)
                .unwrap();
        let bundle = &saved.tabs[&TabId::from_raw(5)];
        assert!(!bundle.incognito);
        assert!(bundle.parent.is_none());
    }
}
