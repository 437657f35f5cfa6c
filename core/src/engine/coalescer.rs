//! Update coalescer
//!
//! The only consumer of the update queue. Events that arrive close together
//! are merged in one pass so consumers see a single refresh per burst.

use super::batch::EngineEvent;
use super::merge::ResultMergeEngine;
use crate::config::EngineConfig;
use crate::error::DispatchError;
use crate::plugin::adapter::panic_message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, error, info};

/// Called once if the update loop dies
pub type FatalHook = Arc<dyn Fn(&DispatchError) + Send + Sync>;

/// Groups queued events and hands them to the merge engine
pub struct UpdateCoalescer {
    receiver: mpsc::Receiver<EngineEvent>,
    engine: ResultMergeEngine,
    cycle: Duration,
    drain_window: Duration,
    cycles: u64,
}

impl UpdateCoalescer {
    pub fn new(
        receiver: mpsc::Receiver<EngineEvent>,
        engine: ResultMergeEngine,
        config: &EngineConfig,
    ) -> Self {
        Self {
            receiver,
            engine,
            cycle: config.refresh_cycle(),
            drain_window: config.drain_window(),
            cycles: 0,
        }
    }

    /// Take one event, then everything that arrives within the drain window
    ///
    /// Also returns the instant the first event arrived, which starts the
    /// cycle. Returns `None` once every sender is gone and the queue is empty.
    pub async fn next_group(&mut self) -> Option<(Instant, Vec<EngineEvent>)> {
        let first = self.receiver.recv().await?;
        let started = Instant::now();
        let mut group = vec![first];

        let deadline = started + self.drain_window;
        while let Ok(Some(event)) = timeout_at(deadline, self.receiver.recv()).await {
            group.push(event);
        }

        Some((started, group))
    }

    /// Run until the queue closes; returns the engine for inspection
    pub async fn run(mut self) -> ResultMergeEngine {
        debug!(
            "Update loop started (cycle {:?}, drain window {:?})",
            self.cycle, self.drain_window
        );

        loop {
            let Some((started, group)) = self.next_group().await else {
                break;
            };
            let size = group.len();

            self.cycles += 1;
            let changed = self.engine.apply_group(group);
            debug!(
                "Cycle {} merged {} events (changed: {})",
                self.cycles, size, changed
            );

            sleep_until(started + self.cycle).await;
        }

        info!("Update loop stopped after {} cycles", self.cycles);
        self.engine
    }

    /// Spawn the loop with a supervisor that reports a panic to `hook`
    ///
    /// The loop is not restarted after a fault.
    pub fn spawn(self, hook: Option<FatalHook>) -> CoalescerHandle {
        let worker = tokio::spawn(self.run());
        CoalescerHandle {
            supervisor: supervise(worker, hook),
        }
    }
}

fn supervise<T: Send + 'static>(
    worker: JoinHandle<T>,
    hook: Option<FatalHook>,
) -> JoinHandle<Result<(), DispatchError>> {
    tokio::spawn(async move {
        match worker.await {
            Ok(_) => Ok(()),
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic().as_ref())
                } else {
                    "update loop was aborted".to_string()
                };
                let fault = DispatchError::LoopFault { message };
                error!("{}", fault);
                if let Some(hook) = hook {
                    hook(&fault);
                }
                Err(fault)
            }
        }
    })
}

/// Handle to a spawned update loop
pub struct CoalescerHandle {
    supervisor: JoinHandle<Result<(), DispatchError>>,
}

impl CoalescerHandle {
    /// Wait for the loop to finish; all senders must be dropped first
    pub async fn join(self) -> Result<(), DispatchError> {
        match self.supervisor.await {
            Ok(result) => result,
            Err(e) => Err(DispatchError::LoopFault {
                message: e.to_string(),
            }),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }
}
