//! Result merge engine
//!
//! Owns the display list. Each batch is reconciled only against the entries
//! of its own plugin, so plugins never disturb each other's rows.

use super::batch::{EngineEvent, ResultBatch};
use crate::config::EngineConfig;
use crate::plugin::PluginMetadata;
use crate::query::Query;
use crate::result::{RefreshedFields, ResultIdentity, ResultItem};
use crate::storage::RecordStores;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Score forced onto pinned results
pub const TOP_MOST_SCORE: i64 = i64::MAX;

/// Natural scores are clamped below the pinned score
pub const MAX_NATURAL_SCORE: i64 = i64::MAX - 1;

/// Top margin hint for a non-empty list
pub const RESULT_LIST_MARGIN: u32 = 8;

/// Limits and weights applied while merging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSettings {
    pub display_cap: usize,
    pub selection_boost: i64,
}

impl From<&EngineConfig> for MergeSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            display_cap: config.display_cap(),
            selection_boost: config.selection_boost,
        }
    }
}

/// A displayed result; `instance_id` survives in-place updates
#[derive(Debug, Clone)]
pub struct DisplayEntry {
    pub instance_id: u64,
    pub result: ResultItem,
}

/// Immutable view of the display list published after each merge pass
#[derive(Debug, Clone, Default)]
pub struct DisplaySnapshot {
    pub revision: u64,
    pub entries: Arc<Vec<DisplayEntry>>,
    pub visible: bool,
    /// Layout hint; non-UI consumers can ignore it
    pub top_margin: u32,
    /// Set when the list went from empty to non-empty in this pass
    pub reset_selection: bool,
}

impl DisplaySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultItem> {
        self.entries.get(index).map(|entry| &entry.result)
    }

    pub fn results(&self) -> impl Iterator<Item = &ResultItem> {
        self.entries.iter().map(|entry| &entry.result)
    }
}

/// Single writer of the display list
pub struct ResultMergeEngine {
    entries: Vec<DisplayEntry>,
    settings: MergeSettings,
    records: RecordStores,
    next_instance_id: u64,
    revision: u64,
    publisher: watch::Sender<DisplaySnapshot>,
}

impl ResultMergeEngine {
    pub fn new(settings: MergeSettings, records: RecordStores) -> Self {
        let (publisher, _) = watch::channel(DisplaySnapshot::default());
        Self {
            entries: Vec::new(),
            settings,
            records,
            next_instance_id: 1,
            revision: 0,
            publisher,
        }
    }

    /// Receive a snapshot after every pass that changed the list
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.publisher.subscribe()
    }

    pub fn entries(&self) -> &[DisplayEntry] {
        &self.entries
    }

    /// Number of snapshots published so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply pins and usage boost to incoming results
    pub fn adjust_scores(
        &self,
        plugin: &PluginMetadata,
        query: &Query,
        results: &mut [ResultItem],
    ) {
        let boost = self.settings.selection_boost;
        self.records.top_most.read(|pins| {
            self.records.user_selected.read(|selected| {
                for result in results.iter_mut() {
                    let identity = result.identity();
                    if pins.is_top_most(query.normalized(), &identity) {
                        result.score = TOP_MOST_SCORE;
                        continue;
                    }

                    let mut score = result.score.min(MAX_NATURAL_SCORE);
                    if !plugin.ignore_auto_score {
                        let usage = i64::from(selected.count(&identity));
                        score = score
                            .saturating_add(usage.saturating_mul(boost))
                            .min(MAX_NATURAL_SCORE);
                    }
                    result.score = score;
                }
            })
        });
    }

    /// Apply a group of events as one pass and publish at most one snapshot
    ///
    /// Completion counters of the group's batches are signalled after the
    /// snapshot is published, whether or not the batch was merged.
    pub fn apply_group(&mut self, events: Vec<EngineEvent>) -> bool {
        let was_empty = self.entries.is_empty();
        let mut changed = false;
        let mut completions = Vec::new();

        for event in events {
            changed |= match event {
                EngineEvent::Results(batch) => {
                    completions.push(batch.completion.clone());
                    self.merge(batch)
                }
                EngineEvent::Retain { plugins, token } => {
                    if token.is_cancelled() {
                        false
                    } else {
                        self.retain_plugins(&plugins)
                    }
                }
                EngineEvent::Clear => self.clear(),
                EngineEvent::Refresh { identity, fields } => self.refresh(&identity, fields),
            };
        }

        if changed {
            self.publish(was_empty);
        }

        for completion in completions {
            completion.complete_one();
        }

        changed
    }

    /// Reconcile one plugin's batch against its displayed results
    pub fn merge(&mut self, batch: ResultBatch) -> bool {
        if batch.is_cancelled() {
            debug!(
                "Dropping stale batch from {} for query {}",
                batch.plugin.id, batch.query
            );
            return false;
        }

        let ResultBatch {
            plugin,
            query,
            mut results,
            ..
        } = batch;

        for result in results.iter_mut() {
            result.plugin_id.clone_from(&plugin.id);
        }
        self.adjust_scores(&plugin, &query, &mut results);

        let incoming: HashSet<String> = results
            .iter()
            .map(|r| r.identity_key().to_string())
            .collect();

        let before = self.entries.len();
        self.entries.retain(|entry| {
            entry.result.plugin_id != plugin.id
                || incoming.contains(entry.result.identity_key())
        });
        let mut changed = self.entries.len() != before;

        let mut fresh = Vec::new();
        for result in results {
            match self.position_of(&plugin.id, result.identity_key()) {
                Some(index) => {
                    let mut entry = self.entries.remove(index);
                    entry.result.absorb(result);
                    self.insert_sorted(entry);
                    changed = true;
                }
                None => fresh.push(result),
            }
        }

        // Highest first, so the cap cuts the lowest-scored newcomers
        fresh.sort_by(|a, b| b.score.cmp(&a.score));
        let mut discarded = 0;
        for result in fresh {
            if self.entries.len() >= self.settings.display_cap {
                discarded += 1;
                continue;
            }
            let entry = DisplayEntry {
                instance_id: self.next_instance_id,
                result,
            };
            self.next_instance_id += 1;
            self.insert_sorted(entry);
            changed = true;
        }

        if discarded > 0 {
            debug!(
                "Display list full, discarded {} results from {}",
                discarded, plugin.id
            );
        }

        self.entries.truncate(self.settings.display_cap);
        changed
    }

    /// Drop results of plugins not in `plugins`
    pub fn retain_plugins(&mut self, plugins: &HashSet<String>) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| plugins.contains(&entry.result.plugin_id));
        self.entries.len() != before
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.entries.is_empty();
        self.entries.clear();
        changed
    }

    /// Update display fields of the entry with `identity`
    pub fn refresh(&mut self, identity: &ResultIdentity, fields: RefreshedFields) -> bool {
        match self.position_of(&identity.plugin_id, &identity.key) {
            Some(index) => {
                self.entries[index].result.apply_refresh(fields);
                true
            }
            None => false,
        }
    }

    fn position_of(&self, plugin_id: &str, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.result.plugin_id == plugin_id && entry.result.identity_key() == key
        })
    }

    /// Insert before the first entry with a strictly lower score
    fn insert_sorted(&mut self, entry: DisplayEntry) {
        let index = self
            .entries
            .iter()
            .position(|existing| existing.result.score < entry.result.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
    }

    fn publish(&mut self, was_empty: bool) {
        self.revision += 1;
        let visible = !self.entries.is_empty();
        let snapshot = DisplaySnapshot {
            revision: self.revision,
            entries: Arc::new(self.entries.clone()),
            visible,
            top_margin: if visible { RESULT_LIST_MARGIN } else { 0 },
            reset_selection: was_empty && visible,
        };
        self.publisher.send_replace(snapshot);
    }
}
