//! Launcher: wires plugins, the query engine and the record stores together
//!
//! Everything the engine needs is owned by a [`Launcher`] value; there is no
//! global state, so several launchers can run side by side in tests.

use crate::config::EngineConfig;
use crate::engine::{
    CoalescerHandle, DisplaySnapshot, FatalHook, MergeSettings, ProgressState, QueryDispatcher,
    ResultMergeEngine, ResultRefresher, RoundHandle, UpdateCoalescer,
};
use crate::error::{PluginError, Result};
use crate::matcher;
use crate::plugin::adapter::{panic_message, panicked, polish_actions};
use crate::plugin::{Plugin, PluginFactory, PluginRegistry};
use crate::query::Query;
use crate::result::{ActionContext, ActionOutcome, Modifiers, ResultAction, ResultItem};
use crate::storage::{QueryHistory, RecordStores};
use chrono::Utc;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Plugin id given to synthesized history results
pub const HISTORY_PLUGIN_ID: &str = "wox.history";

pub const SET_TOP_MOST_TITLE: &str = "Set as topmost in this query";
pub const REMOVE_TOP_MOST_TITLE: &str = "Remove topmost in this query";

/// Builder for [`Launcher`]
pub struct LauncherBuilder {
    config: EngineConfig,
    plugins: Vec<Arc<dyn Plugin>>,
    fatal_hook: Option<FatalHook>,
}

impl LauncherBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            plugins: Vec::new(),
            fatal_hook: None,
        }
    }

    /// Add a plugin
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Add a plugin created by a factory
    pub fn with_factory(self, factory: &dyn PluginFactory) -> Self {
        self.with_plugin(factory.create())
    }

    /// Persist records under `dir`
    pub fn with_storage_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage_dir = Some(dir);
        self
    }

    /// Keep records in memory only
    pub fn in_memory(mut self) -> Self {
        self.config.storage_dir = None;
        self
    }

    /// Called if the update loop dies
    pub fn on_fatal(mut self, hook: FatalHook) -> Self {
        self.fatal_hook = Some(hook);
        self
    }

    /// Validate the configuration, load records and start the engine tasks
    pub async fn build(self) -> Result<Launcher> {
        let LauncherBuilder {
            config,
            plugins,
            fatal_hook,
        } = self;
        config.validate()?;

        let mut registry = PluginRegistry::new();
        for plugin in plugins {
            registry.register(plugin)?;
        }
        for id in &config.disabled_plugins {
            if registry.set_disabled(id, true).is_err() {
                warn!("Cannot disable unknown plugin {}", id);
            }
        }
        let registry = Arc::new(registry);

        let records = match &config.storage_dir {
            Some(dir) => RecordStores::load(dir).await,
            None => RecordStores::in_memory(),
        };
        if records.history.read(QueryHistory::limit) != config.history_limit {
            records
                .history
                .update(|history| history.set_limit(config.history_limit));
        }

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let engine = ResultMergeEngine::new(MergeSettings::from(&config), records.clone());
        let display = engine.subscribe();
        let coalescer = UpdateCoalescer::new(receiver, engine, &config).spawn(fatal_hook);

        let shutdown = CancellationToken::new();
        let refresher = ResultRefresher::new(
            registry.clone(),
            display.clone(),
            sender.clone(),
            shutdown.clone(),
        )
        .spawn();

        let dispatcher = QueryDispatcher::new(registry.clone(), sender, &config);
        for instance in registry.list() {
            if let Some(updater) = dispatcher.updater(instance.id()) {
                instance.plugin.attach_updater(updater);
            }
        }

        info!(
            "Launcher ready with {} plugins ({} disabled)",
            registry.len(),
            registry.list().iter().filter(|p| p.is_disabled()).count()
        );

        Ok(Launcher {
            config,
            registry,
            records,
            dispatcher,
            display,
            coalescer,
            refresher,
            shutdown,
        })
    }
}

/// A running launcher
pub struct Launcher {
    config: EngineConfig,
    registry: Arc<PluginRegistry>,
    records: RecordStores,
    dispatcher: QueryDispatcher,
    display: watch::Receiver<DisplaySnapshot>,
    coalescer: CoalescerHandle,
    refresher: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl Launcher {
    pub fn builder(config: EngineConfig) -> LauncherBuilder {
        LauncherBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn records(&self) -> &RecordStores {
        &self.records
    }

    /// Start a round for new query box text
    pub async fn query(&self, text: &str) -> Result<Option<RoundHandle>> {
        Ok(self.dispatcher.dispatch(text).await?)
    }

    /// Query of the current round
    pub fn current_query(&self) -> Option<Arc<Query>> {
        self.dispatcher.current_query()
    }

    /// Latest published display list
    pub fn snapshot(&self) -> DisplaySnapshot {
        self.display.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.display.clone()
    }

    pub fn progress(&self) -> watch::Receiver<ProgressState> {
        self.dispatcher.progress()
    }

    pub fn set_plugin_disabled(&self, id: &str, disabled: bool) -> Result<()> {
        self.registry.set_disabled(id, disabled)
    }

    /// Run the default action of `result` and record the selection
    pub fn open_result(&self, result: &ResultItem, modifiers: Modifiers) -> ActionOutcome {
        let outcome = match result.default_action() {
            Some(action) => invoke(result, action, modifiers),
            None => ActionOutcome { hide_window: false },
        };
        self.record_selection(result);
        outcome
    }

    /// Run one action of `result` by id
    pub fn execute_action(
        &self,
        result: &ResultItem,
        action_id: &str,
        modifiers: Modifiers,
    ) -> Result<ActionOutcome> {
        let action = result
            .find_action(action_id)
            .ok_or_else(|| PluginError::ActionNotFound {
                action: action_id.to_string(),
            })?;
        let outcome = invoke(result, action, modifiers);
        self.record_selection(result);
        Ok(outcome)
    }

    fn record_selection(&self, result: &ResultItem) {
        let Some(query) = &result.origin_query else {
            return;
        };
        let identity = result.identity();
        self.records.user_selected.update(|counts| counts.add(&identity));
        if !query.is_empty() {
            self.records
                .history
                .update(|history| history.add(query.normalized()));
        }
        debug!("Recorded selection of {} for {}", identity, query);
    }

    /// Context menu of a displayed result
    ///
    /// The owning plugin's entries come first, followed by the top-most toggle
    /// and an entry describing the plugin.
    pub fn context_menu(&self, result: &ResultItem) -> Vec<ResultItem> {
        let Some(instance) = self.registry.get(&result.plugin_id) else {
            return Vec::new();
        };

        let mut entries = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            instance.plugin.context_menu(result)
        })) {
            Ok(entries) => entries,
            Err(payload) => {
                let fault = panicked(instance.id(), payload.as_ref());
                error!("{} building a context menu", fault);
                Vec::new()
            }
        };

        if let Some(query) = &result.origin_query {
            entries.push(self.top_most_entry(result, query));
        }

        let metadata = &instance.metadata;
        let subtitle = if metadata.description.is_empty() {
            format!("{} {}", metadata.id, metadata.version)
        } else {
            metadata.description.clone()
        };
        entries.push(
            ResultItem::new(metadata.name.clone())
                .with_subtitle(subtitle)
                .with_context_data(format!("{}:info", metadata.id)),
        );

        for entry in entries.iter_mut() {
            entry.plugin_id.clone_from(&metadata.id);
            polish_actions(entry);
        }
        entries
    }

    fn top_most_entry(&self, result: &ResultItem, query: &Query) -> ResultItem {
        let identity = result.identity();
        let scope = query.normalized().to_string();
        let pinned = self
            .records
            .top_most
            .read(|pins| pins.has_pin(Some(&scope), &identity));
        let title = if pinned {
            REMOVE_TOP_MOST_TITLE
        } else {
            SET_TOP_MOST_TITLE
        };

        let store = self.records.top_most.clone();
        let action = ResultAction::new(title, move |_| {
            store.update(|pins| {
                if !pins.remove(Some(&scope), &identity) {
                    pins.add(Some(&scope), identity.clone());
                }
            });
            false
        })
        .preventing_hide();

        ResultItem::new(title)
            .with_context_data(format!("topmost:{}", result.identity()))
            .with_action(action)
    }

    /// Pin or unpin `result` for its origin query; returns the new state
    pub fn toggle_top_most(&self, result: &ResultItem) -> bool {
        let identity = result.identity();
        let scope = result
            .origin_query
            .as_ref()
            .map(|query| query.normalized().to_string());
        self.records.top_most.update(|pins| {
            if pins.remove(scope.as_deref(), &identity) {
                false
            } else {
                pins.add(scope.as_deref(), identity);
                true
            }
        })
    }

    /// Keep items whose title or subtitle meets search precision
    pub fn filter_results(&self, items: Vec<ResultItem>, text: &str) -> Vec<ResultItem> {
        matcher::filter_results(items, text)
    }

    /// Query history as results, newest first, filtered by `filter`
    pub fn history_results(&self, filter: &str) -> Vec<ResultItem> {
        let now = Utc::now();
        let items = self.records.history.read(|history| {
            history
                .recent()
                .map(|item| {
                    let mut result = ResultItem::new(item.query.clone())
                        .with_subtitle(item.time_ago(now))
                        .with_context_data(item.query.clone());
                    result.plugin_id = HISTORY_PLUGIN_ID.to_string();
                    result
                })
                .collect::<Vec<_>>()
        });
        matcher::filter_results(items, filter)
    }

    /// Save dirty record stores
    pub async fn save(&self) -> Result<()> {
        self.records.save_all().await
    }

    /// Stop all tasks and save records
    pub async fn shutdown(self) -> Result<()> {
        let Launcher {
            records,
            dispatcher,
            coalescer,
            refresher,
            shutdown,
            ..
        } = self;

        dispatcher.cancel_current();
        shutdown.cancel();
        if let Err(e) = refresher.await {
            warn!("Refresher ended abnormally: {}", e);
        }

        drop(dispatcher);
        if let Err(fault) = coalescer.join().await {
            warn!("Update loop ended with a fault: {}", fault);
        }

        records.save_all().await?;
        info!("Launcher stopped");
        Ok(())
    }
}

fn invoke(result: &ResultItem, action: &ResultAction, modifiers: Modifiers) -> ActionOutcome {
    let context = ActionContext {
        modifiers,
        context_data: result.context_data.clone(),
    };
    match std::panic::catch_unwind(AssertUnwindSafe(|| action.invoke(&context))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            error!(
                "Action '{}' of {} panicked: {}",
                action.name,
                result.identity(),
                panic_message(payload.as_ref())
            );
            ActionOutcome { hide_window: false }
        }
    }
}
