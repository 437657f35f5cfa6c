//! Messages flowing from plugin work units into the update loop

use crate::plugin::PluginMetadata;
use crate::query::Query;
use crate::result::{RefreshedFields, ResultIdentity, ResultItem};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Countdown shared by every batch of one query round
#[derive(Debug)]
pub struct RoundCompletion {
    remaining: AtomicUsize,
    notify: Notify,
}

impl RoundCompletion {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicUsize::new(count),
            notify: Notify::new(),
        })
    }

    /// Count down once; wakes waiters when zero is reached
    pub fn complete_one(&self) {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.notify.notify_waiters();
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Wait until the countdown reaches zero
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_complete() {
                return;
            }
            notified.await;
        }
    }
}

/// Results from one plugin for one query
#[derive(Debug)]
pub struct ResultBatch {
    pub plugin: Arc<PluginMetadata>,
    pub query: Arc<Query>,
    pub results: Vec<ResultItem>,
    pub token: CancellationToken,
    pub completion: Arc<RoundCompletion>,
}

impl ResultBatch {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Work item for the update loop
#[derive(Debug)]
pub enum EngineEvent {
    /// Merge a plugin's batch
    Results(ResultBatch),
    /// Drop results of plugins outside `plugins`; skipped if the round is stale
    Retain {
        plugins: HashSet<String>,
        token: CancellationToken,
    },
    /// Empty the display list
    Clear,
    /// Replace display fields of one displayed result
    Refresh {
        identity: ResultIdentity,
        fields: RefreshedFields,
    },
}
