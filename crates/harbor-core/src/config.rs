//! Browser configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use harbor_suggest::{SuggestLayout, DEFAULT_WEB_SEARCH_THRESHOLD};
use harbor_tabs::{RegistryConfig, DEFAULT_MAX_TABS};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Loaded into new tabs and tabs that cannot be restored
    pub home_page: String,
    /// Search engine URL template (%s replaced with the query)
    pub search_url: String,
    /// OpenSearch suggestion endpoint; remote suggestions are off when unset
    pub suggest_url: Option<String>,
    pub max_tabs: usize,
    pub suggest_layout: SuggestLayout,
    pub web_search_threshold: usize,
    pub suggest_timeout_ms: u64,
    /// History rows kept when the browser starts
    pub max_history: usize,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("browser.db"),
            home_page: "about:blank".to_string(),
            search_url: "https://duckduckgo.com/?q=%s".to_string(),
            suggest_url: None,
            max_tabs: DEFAULT_MAX_TABS,
            suggest_layout: SuggestLayout::default(),
            web_search_threshold: DEFAULT_WEB_SEARCH_THRESHOLD,
            suggest_timeout_ms: 1500,
            max_history: 1000,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Harbor"))
            .unwrap_or_else(|| PathBuf::from(".harbor"))
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tabs == 0 {
            return Err(CoreError::Config("max_tabs must be at least 1".to_string()));
        }
        if !self.search_url.contains("%s") {
            return Err(CoreError::Config(format!(
                "search_url has no %s placeholder: {}",
                self.search_url
            )));
        }
        if let Some(suggest_url) = &self.suggest_url {
            if !suggest_url.contains("%s") {
                return Err(CoreError::Config(format!(
                    "suggest_url has no %s placeholder: {suggest_url}"
                )));
            }
        }
        Ok(())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_tabs: self.max_tabs,
            home_page: self.home_page.clone(),
        }
    }

    pub fn suggest_timeout(&self) -> Duration {
        Duration::from_millis(self.suggest_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
