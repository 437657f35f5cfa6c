//! Query dispatcher
//!
//! Builds a query per text change, cancels the previous round, and fans the
//! query out to every eligible plugin as independent tasks.

use super::batch::{EngineEvent, ResultBatch, RoundCompletion};
use crate::config::EngineConfig;
use crate::error::DispatchError;
use crate::plugin::{polish_results, query_plugin, PluginInstance, PluginMetadata, PluginRegistry};
use crate::query::{Query, QueryBuilder, QueryId};
use crate::result::{RefreshedFields, ResultIdentity, ResultItem};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Progress indicator state; `query_id` is the round it belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub query_id: Option<QueryId>,
    pub visible: bool,
}

struct ActiveRound {
    query: Arc<Query>,
    token: CancellationToken,
}

struct DispatcherShared {
    registry: Arc<PluginRegistry>,
    sender: mpsc::Sender<EngineEvent>,
    progress_delay: Duration,
    next_id: Mutex<u64>,
    current: Mutex<Option<ActiveRound>>,
    progress: watch::Sender<ProgressState>,
}

impl DispatcherShared {
    fn lock_current(&self) -> MutexGuard<'_, Option<ActiveRound>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_round(&self) -> Option<(Arc<Query>, CancellationToken)> {
        self.lock_current()
            .as_ref()
            .map(|round| (round.query.clone(), round.token.clone()))
    }

    /// Only the round that owns the indicator may change it
    fn set_progress(&self, query_id: QueryId, visible: bool) {
        self.progress.send_if_modified(|state| {
            if state.query_id == Some(query_id) && state.visible != visible {
                state.visible = visible;
                true
            } else {
                false
            }
        });
    }
}

/// Handle to one dispatched round
pub struct RoundHandle {
    query: Arc<Query>,
    token: CancellationToken,
    completion: Arc<RoundCompletion>,
    plugin_count: usize,
}

impl RoundHandle {
    pub fn query(&self) -> &Arc<Query> {
        &self.query
    }

    /// Number of plugins the query was sent to
    pub fn plugin_count(&self) -> usize {
        self.plugin_count
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until every plugin's batch went through the update loop
    ///
    /// Returns `false` if a newer round superseded this one first.
    pub async fn finished(&self) -> bool {
        tokio::select! {
            biased;
            _ = self.completion.wait() => true,
            _ = self.token.cancelled() => false,
        }
    }
}

/// Fans queries out to plugins
pub struct QueryDispatcher {
    shared: Arc<DispatcherShared>,
}

impl QueryDispatcher {
    pub fn new(
        registry: Arc<PluginRegistry>,
        sender: mpsc::Sender<EngineEvent>,
        config: &EngineConfig,
    ) -> Self {
        let (progress, _) = watch::channel(ProgressState::default());
        Self {
            shared: Arc::new(DispatcherShared {
                registry,
                sender,
                progress_delay: config.progress_delay(),
                next_id: Mutex::new(0),
                current: Mutex::new(None),
                progress,
            }),
        }
    }

    /// Observe the progress indicator
    pub fn progress(&self) -> watch::Receiver<ProgressState> {
        self.shared.progress.subscribe()
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.shared.registry
    }

    /// The query of the current round
    pub fn current_query(&self) -> Option<Arc<Query>> {
        self.shared.current_round().map(|(query, _)| query)
    }

    /// Cancel the current round without starting a new one
    pub fn cancel_current(&self) {
        if let Some((query, token)) = self.shared.current_round() {
            if !token.is_cancelled() {
                debug!("Cancelling query {}", query);
                token.cancel();
            }
        }
    }

    /// Handle a change of the query box text
    ///
    /// Returns `None` when the text is empty; the display list is cleared.
    pub async fn dispatch(&self, text: &str) -> Result<Option<RoundHandle>, DispatchError> {
        let shared = &self.shared;
        let token = CancellationToken::new();

        let query = {
            let mut next_id = shared.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            *next_id += 1;
            let query = Arc::new(
                QueryBuilder::new(shared.registry.as_ref()).build(QueryId(*next_id), text),
            );

            let mut current = shared.lock_current();
            if let Some(previous) = current.take() {
                if !previous.token.is_cancelled() {
                    debug!("Query {} superseded by {}", previous.query, query);
                    previous.token.cancel();
                }
            }
            *current = Some(ActiveRound {
                query: query.clone(),
                token: token.clone(),
            });
            query
        };

        shared.progress.send_replace(ProgressState {
            query_id: Some(query.id()),
            visible: false,
        });

        if query.is_empty() {
            debug!("Empty query {}, clearing results", query.id());
            shared
                .sender
                .send(EngineEvent::Clear)
                .await
                .map_err(|_| DispatchError::QueueClosed)?;
            return Ok(None);
        }

        let plugins = shared.registry.eligible_for(&query);
        let eligible: HashSet<String> = plugins.iter().map(|p| p.id().to_string()).collect();
        shared
            .sender
            .send(EngineEvent::Retain {
                plugins: eligible,
                token: token.clone(),
            })
            .await
            .map_err(|_| DispatchError::QueueClosed)?;

        let completion = RoundCompletion::new(plugins.len());
        debug!("Dispatching query {} to {} plugins", query, plugins.len());

        for instance in &plugins {
            tokio::spawn(run_plugin(
                instance.clone(),
                query.clone(),
                token.clone(),
                completion.clone(),
                shared.sender.clone(),
            ));
        }

        if !plugins.is_empty() {
            tokio::spawn(track_progress(
                shared.clone(),
                query.id(),
                token.clone(),
                completion.clone(),
            ));
        }

        Ok(Some(RoundHandle {
            query,
            token,
            completion,
            plugin_count: plugins.len(),
        }))
    }

    /// Handle a plugin can use to push results outside the query cycle
    pub fn updater(&self, plugin_id: &str) -> Option<ResultsUpdater> {
        let instance = self.shared.registry.get(plugin_id)?;
        Some(ResultsUpdater {
            plugin: instance.metadata.clone(),
            shared: Arc::downgrade(&self.shared),
        })
    }
}

/// One plugin's share of a round
async fn run_plugin(
    instance: Arc<PluginInstance>,
    query: Arc<Query>,
    token: CancellationToken,
    completion: Arc<RoundCompletion>,
    sender: mpsc::Sender<EngineEvent>,
) {
    if token.is_cancelled() {
        debug!("Skipping {} for stale query {}", instance.id(), query);
        return;
    }

    let results = tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("Query {} cancelled while {} was running", query, instance.id());
            return;
        }
        results = query_plugin(&instance, &query) => results,
    };

    if token.is_cancelled() {
        debug!("Discarding results of {} for stale query {}", instance.id(), query);
        return;
    }

    let batch = ResultBatch {
        plugin: instance.metadata.clone(),
        query,
        results,
        token,
        completion,
    };
    if sender.send(EngineEvent::Results(batch)).await.is_err() {
        warn!("Update queue closed, dropping results from {}", instance.id());
    }
}

async fn track_progress(
    shared: Arc<DispatcherShared>,
    query_id: QueryId,
    token: CancellationToken,
    completion: Arc<RoundCompletion>,
) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = completion.wait() => return,
        _ = tokio::time::sleep(shared.progress_delay) => {}
    }

    shared.set_progress(query_id, true);

    tokio::select! {
        _ = token.cancelled() => return,
        _ = completion.wait() => {}
    }

    shared.set_progress(query_id, false);
}

/// Lets a plugin push results or refreshes on its own schedule
#[derive(Clone)]
pub struct ResultsUpdater {
    plugin: Arc<PluginMetadata>,
    shared: Weak<DispatcherShared>,
}

impl ResultsUpdater {
    pub fn plugin_id(&self) -> &str {
        &self.plugin.id
    }

    /// Push results for `query_id`; ignored unless it is the current query
    pub async fn push(&self, query_id: QueryId, results: Vec<ResultItem>) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };

        let current = shared
            .current_round()
            .filter(|(query, token)| query.id() == query_id && !token.is_cancelled());
        let Some((query, token)) = current else {
            debug!(
                "Ignoring results from {} for stale query {}",
                self.plugin.id, query_id
            );
            return false;
        };

        let batch = ResultBatch {
            plugin: self.plugin.clone(),
            results: polish_results(&self.plugin.id, &query, results),
            query,
            token,
            completion: RoundCompletion::new(1),
        };
        shared.sender.send(EngineEvent::Results(batch)).await.is_ok()
    }

    /// Replace display fields of a displayed result owned by this plugin
    pub async fn refresh(&self, key: &str, fields: RefreshedFields) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let identity = ResultIdentity::new(self.plugin.id.clone(), key);
        shared
            .sender
            .send(EngineEvent::Refresh { identity, fields })
            .await
            .is_ok()
    }
}
