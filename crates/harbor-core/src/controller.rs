//! Browser controller
//!
//! One task exclusively owns the tab registry and the published suggestion
//! lists. Callers talk to it through a cloneable [`ControllerHandle`]; every
//! request carries a oneshot channel for its reply.
//!
//! Suggestion queries run as their own tasks. Each request bumps its
//! widget's generation and a finished query is only published while its
//! generation is still the newest, so a slow query can never overwrite the
//! result of a later one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use harbor_provider::BrowserProvider;
use harbor_suggest::{search_url, SuggestItem, SuggestionAggregator};
use harbor_tabs::{Reclamation, RestoreOptions, Tab, TabError, TabId, TabRegistry, TabSummary};

use crate::error::CoreError;
use crate::events::{BrowserEvent, EventBus};
use crate::intent::{Intent, IntentOutcome};
use crate::state_store::TabStateStore;
use crate::Result;

const COMMAND_BUFFER: usize = 64;

/// A UI element that shows suggestions (address bar, search widget, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetId(pub u32);

impl WidgetId {
    pub const ADDRESS_BAR: WidgetId = WidgetId(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSuggestions {
    pub generation: u64,
    pub prefix: String,
    pub items: Vec<SuggestItem>,
}

/// Latest published suggestions per widget
pub type SuggestionBoard = HashMap<WidgetId, PublishedSuggestions>;

/// Everything the controller takes ownership of.
pub struct ControllerParts {
    pub registry: TabRegistry,
    pub provider: BrowserProvider,
    pub store: TabStateStore,
    pub aggregator: Arc<SuggestionAggregator>,
    pub events: EventBus,
    /// Search engine URL template
    pub search_url: String,
}

enum Command {
    CreateTab {
        incognito: bool,
        reply: oneshot::Sender<Result<TabId>>,
    },
    CreateChildTab {
        parent: TabId,
        reply: oneshot::Sender<Result<TabId>>,
    },
    RemoveTab {
        id: TabId,
        reply: oneshot::Sender<Result<()>>,
    },
    SetActiveTab {
        id: TabId,
        reply: oneshot::Sender<Result<()>>,
    },
    LoadUrl {
        id: TabId,
        url: String,
        reply: oneshot::Sender<Result<()>>,
    },
    UpdatePage {
        id: TabId,
        url: String,
        title: String,
        progress: u8,
        reply: oneshot::Sender<Result<()>>,
    },
    ReclaimMemory {
        reply: oneshot::Sender<Reclamation>,
    },
    Tabs {
        reply: oneshot::Sender<Vec<TabSummary>>,
    },
    CurrentTab {
        reply: oneshot::Sender<Option<TabSummary>>,
    },
    SaveState {
        reply: oneshot::Sender<Result<bool>>,
    },
    RestoreState {
        options: RestoreOptions,
        reply: oneshot::Sender<Result<bool>>,
    },
    Intent {
        intent: Intent,
        reply: oneshot::Sender<Result<IntentOutcome>>,
    },
    Suggest {
        widget: WidgetId,
        prefix: String,
        reply: oneshot::Sender<u64>,
    },
    ClearSuggestions {
        widget: WidgetId,
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<()>>,
    },
}

struct SuggestionReady {
    widget: WidgetId,
    generation: u64,
    prefix: String,
    items: Vec<SuggestItem>,
}

pub struct BrowserController {
    registry: TabRegistry,
    provider: BrowserProvider,
    store: TabStateStore,
    aggregator: Arc<SuggestionAggregator>,
    events: EventBus,
    search_url: String,
    generations: HashMap<WidgetId, u64>,
    suggestions: watch::Sender<SuggestionBoard>,
    results: mpsc::UnboundedSender<SuggestionReady>,
}

impl BrowserController {
    /// Start the controller task. Must be called from within a tokio runtime.
    pub fn spawn(parts: ControllerParts) -> ControllerHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (board_tx, board_rx) = watch::channel(SuggestionBoard::new());

        let controller = BrowserController {
            registry: parts.registry,
            provider: parts.provider,
            store: parts.store,
            aggregator: parts.aggregator,
            events: parts.events,
            search_url: parts.search_url,
            generations: HashMap::new(),
            suggestions: board_tx,
            results: results_tx,
        };
        tokio::spawn(controller.run(commands_rx, results_rx));

        ControllerHandle {
            commands: commands_tx,
            suggestions: board_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut results: mpsc::UnboundedReceiver<SuggestionReady>,
    ) {
        tracing::info!("Browser controller started");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    if !self.handle(command).await {
                        break;
                    }
                }
                Some(ready) = results.recv() => self.publish(ready),
            }
        }

        self.registry.destroy_all();
        tracing::info!("Browser controller stopped");
    }

    /// Returns false once the controller should stop.
    async fn handle(&mut self, command: Command) -> bool {
        // A dropped reply receiver means the caller stopped waiting
        match command {
            Command::CreateTab { incognito, reply } => {
                let result = self.registry.create_tab(incognito);
                let _ = reply.send(self.tab_created(result));
            }
            Command::CreateChildTab { parent, reply } => {
                let result = self.registry.create_child_tab(parent);
                let _ = reply.send(self.tab_created(result));
            }
            Command::RemoveTab { id, reply } => {
                let _ = reply.send(self.remove_tab(id));
            }
            Command::SetActiveTab { id, reply } => {
                let _ = reply.send(self.set_active_tab(id));
            }
            Command::LoadUrl { id, url, reply } => {
                let _ = reply.send(self.registry.load_url(id, &url).map_err(CoreError::from));
            }
            Command::UpdatePage {
                id,
                url,
                title,
                progress,
                reply,
            } => {
                let _ = reply.send(self.update_page(id, url, title, progress).await);
            }
            Command::ReclaimMemory { reply } => {
                let _ = reply.send(self.reclaim_memory());
            }
            Command::Tabs { reply } => {
                let _ = reply.send(self.registry.summaries());
            }
            Command::CurrentTab { reply } => {
                let _ = reply.send(self.registry.current().map(Tab::summary));
            }
            Command::SaveState { reply } => {
                let _ = reply.send(self.save_state().await);
            }
            Command::RestoreState { options, reply } => {
                let _ = reply.send(self.restore_state(options).await);
            }
            Command::Intent { intent, reply } => {
                let _ = reply.send(self.handle_intent(intent).await);
            }
            Command::Suggest {
                widget,
                prefix,
                reply,
            } => {
                let _ = reply.send(self.start_suggest(widget, prefix));
            }
            Command::ClearSuggestions { widget, reply } => {
                self.clear_suggestions(widget);
                let _ = reply.send(());
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(self.shutdown().await);
                return false;
            }
        }
        true
    }

    // === Tabs ===

    fn tab_created(&self, result: harbor_tabs::Result<TabId>) -> Result<TabId> {
        match result {
            Ok(id) => {
                self.events.emit(BrowserEvent::TabCreated(id));
                Ok(id)
            }
            Err(TabError::RegistryFull { max }) => {
                self.events.emit(BrowserEvent::TabLimitReached { max });
                Err(TabError::RegistryFull { max }.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn remove_tab(&mut self, id: TabId) -> Result<()> {
        self.registry.remove_tab(id)?;
        self.events.emit(BrowserEvent::TabRemoved(id));
        Ok(())
    }

    fn set_active_tab(&mut self, id: TabId) -> Result<()> {
        self.registry.set_active_tab(id)?;
        self.events.emit(BrowserEvent::TabActivated(id));
        Ok(())
    }

    /// A finished load in a regular tab counts as a visit.
    async fn update_page(
        &mut self,
        id: TabId,
        url: String,
        title: String,
        progress: u8,
    ) -> Result<()> {
        self.registry.update_page(id, &url, &title, progress)?;

        let incognito = self.registry.get(id).is_some_and(Tab::is_incognito);
        if progress >= 100 && !incognito {
            let provider = self.provider.clone();
            tokio::task::spawn_blocking(move || provider.update_visited_history(&url, &title))
                .await??;
        }
        Ok(())
    }

    fn reclaim_memory(&mut self) -> Reclamation {
        let outcome = self.registry.reclaim_memory();
        if let Reclamation::Released(ids) = &outcome {
            if !ids.is_empty() {
                self.events.emit(BrowserEvent::TabsReclaimed(ids.clone()));
            }
        }
        outcome
    }

    /// Open `url` in a new foreground tab. When the registry is full the
    /// least used tab is recycled.
    fn open_in_new_tab(&mut self, url: &str, app_id: Option<String>) -> Result<TabId> {
        // Nothing is created or recycled for a URL that cannot load
        if url.trim().is_empty() {
            return Err(TabError::InvalidUrl("URL cannot be empty".to_string()).into());
        }

        if !self.registry.can_create_tab() {
            if let Some(victim) = self.registry.least_used_tab() {
                tracing::info!(tab_id = %victim, "Recycling least used tab");
                self.remove_tab(victim)?;
            }
        }

        let result = self.registry.create_tab(false);
        let id = self.tab_created(result)?;
        self.registry.load_url(id, url)?;
        if app_id.is_some() {
            self.registry.set_app_id(id, app_id)?;
        }
        self.set_active_tab(id)?;
        Ok(id)
    }

    // === Persistence ===

    /// Returns whether any tab was saved. With no tabs the stored state is
    /// cleared.
    async fn save_state(&mut self) -> Result<bool> {
        let saved = self.registry.save_state();
        let saved_any = saved.is_some();

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || match saved {
            Some(saved) => store.save(&saved),
            None => store.clear(),
        })
        .await??;

        Ok(saved_any)
    }

    async fn restore_state(&mut self, options: RestoreOptions) -> Result<bool> {
        let store = self.store.clone();
        let Some(saved) = tokio::task::spawn_blocking(move || store.load()).await?? else {
            return Ok(false);
        };
        if !TabRegistry::can_restore(&saved) {
            return Ok(false);
        }

        self.registry.restore_state(&saved, None, options)?;
        self.events.emit(BrowserEvent::TabsRestored {
            count: self.registry.len(),
        });
        if let Some(id) = self.registry.current_id() {
            self.events.emit(BrowserEvent::TabActivated(id));
        }
        Ok(true)
    }

    async fn shutdown(&mut self) -> Result<()> {
        let result = self.save_state().await.map(|_| ());
        self.registry.destroy_all();
        result
    }

    // === Intents ===

    async fn handle_intent(&mut self, intent: Intent) -> Result<IntentOutcome> {
        tracing::debug!(?intent, "Handling intent");

        match intent {
            Intent::NewTab { url } => {
                let url = url.unwrap_or_else(|| self.registry.config().home_page.clone());
                self.open_in_new_tab(&url, None).map(IntentOutcome::Tab)
            }
            Intent::ViewUrl { url, app_id } => {
                let existing = app_id
                    .as_deref()
                    .and_then(|app_id| self.registry.find_by_app_id(app_id));
                match existing {
                    Some(id) => {
                        self.registry.load_url(id, &url)?;
                        self.set_active_tab(id)?;
                        Ok(IntentOutcome::Tab(id))
                    }
                    None => self.open_in_new_tab(&url, app_id).map(IntentOutcome::Tab),
                }
            }
            Intent::Search { query } => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    return Err(TabError::InvalidUrl("search query is empty".to_string()).into());
                }

                let url = search_url(&self.search_url, &query);
                let incognito = self.registry.current().is_some_and(Tab::is_incognito);
                if !incognito {
                    let provider = self.provider.clone();
                    tokio::task::spawn_blocking(move || provider.record_search(&query)).await??;
                }

                let id = match self.registry.current_id() {
                    Some(id) => {
                        self.registry.load_url(id, &url)?;
                        id
                    }
                    None => self.open_in_new_tab(&url, None)?,
                };
                Ok(IntentOutcome::Tab(id))
            }
            Intent::ShowBookmarks => {
                let provider = self.provider.clone();
                let rows = tokio::task::spawn_blocking(move || provider.bookmarks()).await??;
                Ok(IntentOutcome::Bookmarks(rows))
            }
        }
    }

    // === Suggestions ===

    fn start_suggest(&mut self, widget: WidgetId, prefix: String) -> u64 {
        let generation = {
            let counter = self.generations.entry(widget).or_insert(0);
            *counter += 1;
            *counter
        };
        let incognito = self.registry.current().is_some_and(Tab::is_incognito);

        let aggregator = Arc::clone(&self.aggregator);
        let results = self.results.clone();
        tokio::spawn(async move {
            let items: Vec<SuggestItem> = aggregator.query(&prefix, incognito).await.collect();
            // Fails only once the controller has stopped
            let _ = results.send(SuggestionReady {
                widget,
                generation,
                prefix,
                items,
            });
        });

        generation
    }

    fn publish(&mut self, ready: SuggestionReady) {
        if self.generations.get(&ready.widget) != Some(&ready.generation) {
            tracing::debug!(
                widget = ready.widget.0,
                generation = ready.generation,
                "Dropping stale suggestions"
            );
            return;
        }

        let SuggestionReady {
            widget,
            generation,
            prefix,
            items,
        } = ready;
        self.suggestions.send_modify(|board| {
            board.insert(
                widget,
                PublishedSuggestions {
                    generation,
                    prefix,
                    items,
                },
            );
        });
        self.events
            .emit(BrowserEvent::SuggestionsPublished { widget, generation });
    }

    /// Drop the widget's list and invalidate queries still in flight.
    fn clear_suggestions(&mut self, widget: WidgetId) {
        *self.generations.entry(widget).or_insert(0) += 1;
        self.suggestions.send_modify(|board| {
            board.remove(&widget);
        });
    }
}

/// Cloneable client side of the controller.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    suggestions: watch::Receiver<SuggestionBoard>,
}

impl ControllerHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| CoreError::ControllerClosed)?;
        response.await.map_err(|_| CoreError::ControllerClosed)
    }

    pub async fn create_tab(&self, incognito: bool) -> Result<TabId> {
        self.request(|reply| Command::CreateTab { incognito, reply })
            .await?
    }

    pub async fn create_child_tab(&self, parent: TabId) -> Result<TabId> {
        self.request(|reply| Command::CreateChildTab { parent, reply })
            .await?
    }

    pub async fn remove_tab(&self, id: TabId) -> Result<()> {
        self.request(|reply| Command::RemoveTab { id, reply }).await?
    }

    pub async fn set_active_tab(&self, id: TabId) -> Result<()> {
        self.request(|reply| Command::SetActiveTab { id, reply })
            .await?
    }

    pub async fn load_url(&self, id: TabId, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        self.request(|reply| Command::LoadUrl { id, url, reply })
            .await?
    }

    pub async fn update_page(
        &self,
        id: TabId,
        url: impl Into<String>,
        title: impl Into<String>,
        progress: u8,
    ) -> Result<()> {
        let (url, title) = (url.into(), title.into());
        self.request(|reply| Command::UpdatePage {
            id,
            url,
            title,
            progress,
            reply,
        })
        .await?
    }

    /// Report a finished load; recorded as a visit unless the tab is
    /// incognito.
    pub async fn page_finished(
        &self,
        id: TabId,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<()> {
        self.update_page(id, url, title, 100).await
    }

    pub async fn reclaim_memory(&self) -> Result<Reclamation> {
        self.request(|reply| Command::ReclaimMemory { reply }).await
    }

    pub async fn tabs(&self) -> Result<Vec<TabSummary>> {
        self.request(|reply| Command::Tabs { reply }).await
    }

    pub async fn current_tab(&self) -> Result<Option<TabSummary>> {
        self.request(|reply| Command::CurrentTab { reply }).await
    }

    pub async fn save_state(&self) -> Result<bool> {
        self.request(|reply| Command::SaveState { reply }).await?
    }

    pub async fn restore_state(&self, options: RestoreOptions) -> Result<bool> {
        self.request(|reply| Command::RestoreState { options, reply })
            .await?
    }

    pub async fn handle_intent(&self, intent: Intent) -> Result<IntentOutcome> {
        self.request(|reply| Command::Intent { intent, reply })
            .await?
    }

    /// Start a suggestion query; returns its generation. The result shows up
    /// on [`ControllerHandle::suggestions`] unless a newer query for the same
    /// widget was started in the meantime.
    pub async fn suggest(&self, widget: WidgetId, prefix: impl Into<String>) -> Result<u64> {
        let prefix = prefix.into();
        self.request(|reply| Command::Suggest {
            widget,
            prefix,
            reply,
        })
        .await
    }

    pub async fn clear_suggestions(&self, widget: WidgetId) -> Result<()> {
        self.request(|reply| Command::ClearSuggestions { widget, reply })
            .await
    }

    pub fn suggestions(&self) -> watch::Receiver<SuggestionBoard> {
        self.suggestions.clone()
    }

    pub fn latest_suggestions(&self, widget: WidgetId) -> Option<PublishedSuggestions> {
        self.suggestions.borrow().get(&widget).cloned()
    }

    /// Save tab state and stop the controller.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await?
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use harbor_provider::{BookmarkValues, BrowserUri, ContentValues};
    use harbor_storage::Database;
    use harbor_suggest::{
        SearchHistorySource, SuggestKind, SuggestLayout, SuggestQuery, SuggestionSource,
    };
    use harbor_tabs::{HeadlessFactory, RegistryConfig};
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Answers prefixes starting with "slow" after a delay.
    struct DelayedSource;

    impl SuggestionSource for DelayedSource {
        fn name(&self) -> &'static str {
            "delayed"
        }

        fn kind(&self) -> SuggestKind {
            SuggestKind::BrowsingHistory
        }

        fn query(
            &self,
            query: SuggestQuery,
        ) -> BoxFuture<'_, harbor_suggest::Result<Vec<SuggestItem>>> {
            Box::pin(async move {
                if query.prefix.starts_with("slow") {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                Ok(vec![SuggestItem::new(
                    SuggestKind::BrowsingHistory,
                    query.prefix,
                    None,
                )])
            })
        }
    }

    struct Fixture {
        handle: ControllerHandle,
        db: Database,
        events: EventBus,
        factory: HeadlessFactory,
    }

    fn start(db: Database, max_tabs: usize) -> Fixture {
        let provider = BrowserProvider::new(db.clone());
        let factory = HeadlessFactory::new();
        let registry = TabRegistry::new(
            RegistryConfig {
                max_tabs,
                home_page: "about:home".to_string(),
            },
            Arc::new(factory.clone()),
        );

        let mut aggregator = SuggestionAggregator::new(SuggestLayout::default());
        aggregator.register(Arc::new(SearchHistorySource::new(provider.clone())));
        aggregator.register(Arc::new(DelayedSource));

        let events = EventBus::new();
        let handle = BrowserController::spawn(ControllerParts {
            registry,
            provider,
            store: TabStateStore::new(db.clone()),
            aggregator: Arc::new(aggregator),
            events: events.clone(),
            search_url: "https://search.example/?q=%s".to_string(),
        });

        Fixture {
            handle,
            db,
            events,
            factory,
        }
    }

    #[tokio::test]
    async fn test_tab_lifecycle() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        let handle = &fixture.handle;

        let a = handle.create_tab(false).await.unwrap();
        let b = handle.create_child_tab(a).await.unwrap();
        handle.set_active_tab(b).await.unwrap();
        handle.load_url(b, "https://b.example").await.unwrap();

        let current = handle.current_tab().await.unwrap().unwrap();
        assert_eq!(current.id, b);
        assert_eq!(current.parent, Some(a));
        assert_eq!(current.url, "https://b.example");

        handle.remove_tab(a).await.unwrap();
        let tabs = handle.tabs().await.unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].parent, None);
    }

    #[tokio::test]
    async fn test_registry_full_emits_warning() {
        let fixture = start(Database::open_in_memory().unwrap(), 1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = fixture
            .events
            .subscribe(move |event| sink.lock().push(event.clone()));

        let first = fixture.handle.create_tab(false).await.unwrap();
        let err = fixture.handle.create_tab(false).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Tab(TabError::RegistryFull { max: 1 })
        ));
        assert_eq!(
            *seen.lock(),
            vec![
                BrowserEvent::TabCreated(first),
                BrowserEvent::TabLimitReached { max: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_page_finished_records_visit() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        let handle = &fixture.handle;
        let provider = BrowserProvider::new(fixture.db.clone());

        let normal = handle.create_tab(false).await.unwrap();
        let private = handle.create_tab(true).await.unwrap();
        handle
            .page_finished(normal, "https://seen.example", "Seen")
            .await
            .unwrap();
        handle
            .page_finished(private, "https://secret.example", "Secret")
            .await
            .unwrap();

        let rows = provider
            .query(&BrowserUri::Bookmarks, &harbor_provider::Selection::all(), None)
            .unwrap()
            .into_bookmarks();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, "https://seen.example");
        assert_eq!(rows[0].visits, 1);
    }

    #[tokio::test]
    async fn test_save_and_restore_across_controllers() {
        let db = Database::open_in_memory().unwrap();

        let first = start(db.clone(), 4);
        let a = first.handle.create_tab(false).await.unwrap();
        let b = first.handle.create_tab(false).await.unwrap();
        let private = first.handle.create_tab(true).await.unwrap();
        first.handle.load_url(a, "https://a.example").await.unwrap();
        first.handle.load_url(b, "https://b.example").await.unwrap();
        first.handle.set_active_tab(b).await.unwrap();
        first.handle.shutdown().await.unwrap();
        assert_eq!(first.factory.live(), 0);
        assert!(matches!(
            first.handle.tabs().await,
            Err(CoreError::ControllerClosed)
        ));

        let second = start(db, 4);
        assert!(second
            .handle
            .restore_state(RestoreOptions::default())
            .await
            .unwrap());

        let tabs = second.handle.tabs().await.unwrap();
        let ids: Vec<TabId> = tabs.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(!ids.contains(&private));

        let current = second.handle.current_tab().await.unwrap().unwrap();
        assert_eq!(current.id, b);
        assert_eq!(current.url, "https://b.example");
        assert_eq!(second.factory.created(), 1);

        let next = second.handle.create_tab(false).await.unwrap();
        assert!(next > private);
    }

    #[tokio::test]
    async fn test_restore_without_saved_state() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        assert!(!fixture
            .handle
            .restore_state(RestoreOptions::default())
            .await
            .unwrap());
        // Nothing to save clears any previous record
        assert!(!fixture.handle.save_state().await.unwrap());
    }

    #[tokio::test]
    async fn test_view_url_reuses_app_tab() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        let handle = &fixture.handle;

        let intent = |url: &str| Intent::ViewUrl {
            url: url.to_string(),
            app_id: Some("mail".to_string()),
        };
        let first = handle
            .handle_intent(intent("https://one.example"))
            .await
            .unwrap()
            .tab()
            .unwrap();
        handle
            .handle_intent(Intent::NewTab { url: None })
            .await
            .unwrap();
        let second = handle
            .handle_intent(intent("https://two.example"))
            .await
            .unwrap()
            .tab()
            .unwrap();

        assert_eq!(first, second);
        let current = handle.current_tab().await.unwrap().unwrap();
        assert_eq!(current.id, first);
        assert_eq!(current.url, "https://two.example");
        assert_eq!(handle.tabs().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_new_tab_recycles_least_used() {
        let fixture = start(Database::open_in_memory().unwrap(), 2);
        let handle = &fixture.handle;

        let open = |url: &str| Intent::NewTab {
            url: Some(url.to_string()),
        };
        let a = handle.handle_intent(open("https://a.example")).await.unwrap();
        let b = handle.handle_intent(open("https://b.example")).await.unwrap();
        let c = handle.handle_intent(open("https://c.example")).await.unwrap();

        let ids: Vec<TabId> = handle.tabs().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.tab().unwrap(), c.tab().unwrap()]);
        assert!(!ids.contains(&a.tab().unwrap()));
    }

    #[tokio::test]
    async fn test_empty_url_intent_leaves_tabs_alone() {
        let fixture = start(Database::open_in_memory().unwrap(), 1);
        let handle = &fixture.handle;

        let err = handle
            .handle_intent(Intent::NewTab {
                url: Some(String::new()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Tab(TabError::InvalidUrl(_))));
        assert!(handle.tabs().await.unwrap().is_empty());
        assert_eq!(handle.current_tab().await.unwrap(), None);

        // A full registry keeps its least used tab
        let kept = handle
            .handle_intent(Intent::NewTab {
                url: Some("https://a.example".to_string()),
            })
            .await
            .unwrap()
            .tab()
            .unwrap();
        let err = handle
            .handle_intent(Intent::ViewUrl {
                url: "  ".to_string(),
                app_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Tab(TabError::InvalidUrl(_))));
        let ids: Vec<TabId> = handle.tabs().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![kept]);
        assert_eq!(fixture.factory.live(), 1);
    }

    #[tokio::test]
    async fn test_search_and_bookmark_intents() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        let handle = &fixture.handle;
        let provider = BrowserProvider::new(fixture.db.clone());
        provider
            .insert(
                &BrowserUri::Bookmarks,
                ContentValues::Bookmark(BookmarkValues::bookmark("Rust", "https://rust-lang.org")),
            )
            .unwrap();

        let id = handle
            .handle_intent(Intent::Search {
                query: "rust async".to_string(),
            })
            .await
            .unwrap()
            .tab()
            .unwrap();
        let current = handle.current_tab().await.unwrap().unwrap();
        assert_eq!(current.id, id);
        assert_eq!(current.url, "https://search.example/?q=rust+async");

        let searches = provider
            .query(&BrowserUri::Searches, &harbor_provider::Selection::all(), None)
            .unwrap()
            .into_searches();
        assert_eq!(searches[0].search, "rust async");

        match handle.handle_intent(Intent::ShowBookmarks).await.unwrap() {
            IntentOutcome::Bookmarks(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].title.as_deref(), Some("Rust"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stale_suggestions_never_published() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        let handle = &fixture.handle;
        let widget = WidgetId::ADDRESS_BAR;

        let slow = handle.suggest(widget, "slow query").await.unwrap();
        let fast = handle.suggest(widget, "fast").await.unwrap();
        assert!(fast > slow);

        let mut board = handle.suggestions();
        board
            .wait_for(|board| board.contains_key(&widget))
            .await
            .unwrap();
        let published = handle.latest_suggestions(widget).unwrap();
        assert_eq!(published.generation, fast);
        assert_eq!(published.prefix, "fast");

        // Give the slow query time to finish; it must not replace "fast"
        tokio::time::sleep(Duration::from_millis(400)).await;
        let published = handle.latest_suggestions(widget).unwrap();
        assert_eq!(published.generation, fast);
        assert_eq!(published.items[0].title, "fast");
    }

    #[tokio::test]
    async fn test_clear_suggestions_invalidates_pending() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        let handle = &fixture.handle;
        let widget = WidgetId(7);

        handle.suggest(widget, "slow").await.unwrap();
        handle.clear_suggestions(widget).await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(handle.latest_suggestions(widget).is_none());
    }

    #[tokio::test]
    async fn test_reclaim_emits_event() {
        let fixture = start(Database::open_in_memory().unwrap(), 4);
        let handle = &fixture.handle;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = fixture.events.subscribe(move |event| {
            if let BrowserEvent::TabsReclaimed(ids) = event {
                sink.lock().extend(ids.iter().copied());
            }
        });

        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(handle.create_tab(false).await.unwrap());
        }
        handle.set_active_tab(ids[3]).await.unwrap();

        let outcome = handle.reclaim_memory().await.unwrap();
        assert_eq!(outcome, Reclamation::Released(vec![ids[0], ids[1]]));
        assert_eq!(*seen.lock(), vec![ids[0], ids[1]]);
    }
}
