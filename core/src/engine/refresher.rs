//! Periodic refresh of displayed results

use super::batch::EngineEvent;
use super::merge::DisplaySnapshot;
use crate::plugin::adapter::panicked;
use crate::plugin::PluginRegistry;
use crate::result::{ResultItem, REFRESH_GRANULARITY_MS};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Ticks every refresh granularity and asks owning plugins for new fields
pub struct ResultRefresher {
    registry: Arc<PluginRegistry>,
    display: watch::Receiver<DisplaySnapshot>,
    sender: mpsc::Sender<EngineEvent>,
    shutdown: CancellationToken,
}

impl ResultRefresher {
    pub fn new(
        registry: Arc<PluginRegistry>,
        display: watch::Receiver<DisplaySnapshot>,
        sender: mpsc::Sender<EngineEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            display,
            sender,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until the shutdown token fires or the update queue closes
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(Duration::from_millis(REFRESH_GRANULARITY_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        let mut elapsed_ms: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            elapsed_ms = elapsed_ms.wrapping_add(REFRESH_GRANULARITY_MS);

            let due = due_results(&self.display.borrow(), elapsed_ms);
            for result in due {
                if !self.refresh_one(&result).await {
                    debug!("Update queue closed, stopping refresher");
                    return;
                }
            }
        }

        debug!("Refresher stopped");
    }

    /// Returns false once the queue is closed
    async fn refresh_one(&self, result: &ResultItem) -> bool {
        let Some(instance) = self.registry.get(&result.plugin_id) else {
            return true;
        };
        if instance.is_disabled() {
            return true;
        }

        let fields = match AssertUnwindSafe(instance.plugin.refresh(result))
            .catch_unwind()
            .await
        {
            Ok(Some(fields)) => fields,
            Ok(None) => return true,
            Err(payload) => {
                let fault = panicked(instance.id(), payload.as_ref());
                error!("{} while refreshing {}", fault, result.identity_key());
                return true;
            }
        };

        self.sender
            .send(EngineEvent::Refresh {
                identity: result.identity(),
                fields,
            })
            .await
            .is_ok()
    }
}

/// Displayed results whose interval divides `elapsed_ms`
fn due_results(snapshot: &DisplaySnapshot, elapsed_ms: u64) -> Vec<ResultItem> {
    snapshot
        .results()
        .filter(|result| match result.refresh_interval_ms {
            Some(interval) if interval > 0 => elapsed_ms % interval == 0,
            _ => false,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::merge::DisplayEntry;

    fn snapshot(results: Vec<ResultItem>) -> DisplaySnapshot {
        let entries = results
            .into_iter()
            .enumerate()
            .map(|(i, result)| DisplayEntry {
                instance_id: i as u64,
                result,
            })
            .collect();
        DisplaySnapshot {
            revision: 1,
            entries: Arc::new(entries),
            visible: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_due_results_follow_interval() {
        let snapshot = snapshot(vec![
            ResultItem::new("fast").with_refresh_interval(100),
            ResultItem::new("slow").with_refresh_interval(300),
            ResultItem::new("static"),
        ]);

        let titles = |ms| -> Vec<String> {
            due_results(&snapshot, ms)
                .into_iter()
                .map(|r| r.title)
                .collect()
        };

        assert_eq!(titles(100), vec!["fast"]);
        assert_eq!(titles(200), vec!["fast"]);
        assert_eq!(titles(300), vec!["fast", "slow"]);
    }
}
