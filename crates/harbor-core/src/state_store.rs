//! Persisted tab state
//!
//! The saved tab layout lives in the settings table as JSON, so it survives
//! process death and is written in the same database as everything else.

use harbor_storage::Database;
use harbor_tabs::SavedTabs;

use crate::Result;

const SAVED_TABS_KEY: &str = "saved_tabs";

pub struct TabStateStore {
    db: Database,
}

impl TabStateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn save(&self, saved: &SavedTabs) -> Result<()> {
        self.db.set_setting(SAVED_TABS_KEY, &saved.to_json()?)?;
        tracing::debug!(tabs = saved.positions.len(), "Persisted tab state");
        Ok(())
    }

    /// Saved state, if any. An unreadable record is dropped and reported as
    /// absent.
    pub fn load(&self) -> Result<Option<SavedTabs>> {
        let Some(json) = self.db.get_setting(SAVED_TABS_KEY)? else {
            return Ok(None);
        };

        match SavedTabs::from_json(&json) {
            Ok(saved) => Ok(Some(saved)),
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable tab state");
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.db.remove_setting(SAVED_TABS_KEY)?;
        Ok(())
    }
}

impl Clone for TabStateStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_tabs::{TabBundle, TabId};

    #[test]
    fn test_save_and_load() {
        let store = TabStateStore::new(Database::open_in_memory().unwrap());
        assert!(store.load().unwrap().is_none());

        let id = TabId::from_raw(7);
        let mut saved = SavedTabs {
            positions: vec![id],
            current: Some(id),
            ..SavedTabs::default()
        };
        saved.tabs.insert(
            id,
            TabBundle {
                url: "https://example.com".to_string(),
                ..Default::default()
            },
        );

        store.save(&saved).unwrap();
        assert_eq!(store.load().unwrap(), Some(saved));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_state_is_dropped() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting(SAVED_TABS_KEY, "{not json").unwrap();

        let store = TabStateStore::new(db.clone());
        assert!(store.load().unwrap().is_none());
        assert!(db.get_setting(SAVED_TABS_KEY).unwrap().is_none());
    }
}
