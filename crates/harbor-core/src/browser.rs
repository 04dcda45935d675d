//! Browser application context
//!
//! Opens the store, wires the suggestion sources and starts the controller
//! that owns all tab state.

use std::sync::Arc;

use harbor_provider::BrowserProvider;
use harbor_storage::Database;
use harbor_suggest::{
    search_url, BookmarkHistorySource, RemoteSuggestSource, SearchHistorySource,
    SuggestedUrlSource, SuggestionAggregator,
};
use harbor_tabs::{SurfaceFactory, TabRegistry};

use crate::config::Config;
use crate::controller::{BrowserController, ControllerHandle, ControllerParts};
use crate::error::CoreError;
use crate::events::EventBus;
use crate::state_store::TabStateStore;
use crate::Result;

/// Settings key overriding the configured search engine
const SEARCH_URL_KEY: &str = "search_url";

pub struct Harbor {
    config: Config,
    db: Database,
    provider: BrowserProvider,
    events: EventBus,
    controller: ControllerHandle,
}

impl Harbor {
    /// Open the configured database and start the controller. Must be
    /// called from within a tokio runtime.
    pub fn open(config: Config, factory: Arc<dyn SurfaceFactory>) -> Result<Self> {
        config.validate()?;
        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db, factory)
    }

    pub fn with_database(
        mut config: Config,
        db: Database,
        factory: Arc<dyn SurfaceFactory>,
    ) -> Result<Self> {
        // Apply persisted search engine preference if available
        if let Some(template) = db.get_setting(SEARCH_URL_KEY)? {
            config.search_url = template;
        }

        let provider = BrowserProvider::new(db.clone());
        let trimmed = provider.truncate_history(config.max_history)?;
        if trimmed > 0 {
            tracing::debug!(trimmed, "Trimmed browsing history at startup");
        }

        let aggregator = Arc::new(build_aggregator(&config, &provider));
        let events = EventBus::new();
        let controller = BrowserController::spawn(ControllerParts {
            registry: TabRegistry::new(config.registry_config(), factory),
            provider: provider.clone(),
            store: TabStateStore::new(db.clone()),
            aggregator,
            events: events.clone(),
            search_url: config.search_url.clone(),
        });

        tracing::info!(
            database = %config.database_path.display(),
            max_tabs = config.max_tabs,
            "Browser initialized"
        );

        Ok(Self {
            config,
            db,
            provider,
            events,
            controller,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn provider(&self) -> &BrowserProvider {
        &self.provider
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    pub fn search_url(&self, query: &str) -> String {
        search_url(&self.config.search_url, query)
    }

    /// Persist a new search engine. Takes effect on the next start.
    pub fn set_search_engine(&mut self, template: &str) -> Result<()> {
        if !template.contains("%s") {
            return Err(CoreError::Config(format!(
                "search template has no %s placeholder: {template}"
            )));
        }
        self.db.set_setting(SEARCH_URL_KEY, template)?;
        self.config.search_url = template.to_string();
        Ok(())
    }
}

fn build_aggregator(config: &Config, provider: &BrowserProvider) -> SuggestionAggregator {
    let mut aggregator = SuggestionAggregator::new(config.suggest_layout)
        .with_web_search_threshold(config.web_search_threshold);

    aggregator.register(Arc::new(SearchHistorySource::new(provider.clone())));
    if let Some(template) = &config.suggest_url {
        match RemoteSuggestSource::new(template.clone(), config.suggest_timeout()) {
            Ok(source) => aggregator.register(Arc::new(source)),
            Err(err) => tracing::warn!(error = %err, "Remote suggestions unavailable"),
        }
    }
    aggregator.register(Arc::new(BookmarkHistorySource::new(provider.clone())));
    aggregator.register(Arc::new(SuggestedUrlSource));

    aggregator
}
