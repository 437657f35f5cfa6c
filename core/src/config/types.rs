//! Engine configuration types
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Multiplier applied to `max_results_to_show` to get the display list cap
pub const DISPLAY_CAP_FACTOR: usize = 5;

/// Tuning values for the query engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of rows visible at once; also the page size for selection moves
    pub max_results_to_show: usize,
    /// Score added per recorded user selection of a result
    pub selection_boost: i64,
    /// Delay before the progress indicator is shown for a slow round
    pub progress_delay_ms: u64,
    /// Length of one coalescer cycle
    pub refresh_cycle_ms: u64,
    /// Capacity of the bounded update queue
    pub queue_capacity: usize,
    /// Maximum number of query history items kept
    pub history_limit: usize,
    /// Plugin ids that are never dispatched to
    pub disabled_plugins: Vec<String>,
    /// Directory for persisted records; in-memory when unset
    pub storage_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_results_to_show: 6,
            selection_boost: 10,
            progress_delay_ms: 200,
            refresh_cycle_ms: 50,
            queue_capacity: 1024,
            history_limit: 300,
            disabled_plugins: Vec::new(),
            storage_dir: None,
        }
    }
}

impl EngineConfig {
    /// Maximum number of entries the display list may hold
    pub fn display_cap(&self) -> usize {
        self.max_results_to_show * DISPLAY_CAP_FACTOR
    }

    pub fn progress_delay(&self) -> Duration {
        Duration::from_millis(self.progress_delay_ms)
    }

    pub fn refresh_cycle(&self) -> Duration {
        Duration::from_millis(self.refresh_cycle_ms)
    }

    /// Window in which additional batches are drained into the current group
    pub fn drain_window(&self) -> Duration {
        self.refresh_cycle() / 10
    }

    /// Set the storage directory
    pub fn with_storage_dir(mut self, dir: PathBuf) -> Self {
        self.storage_dir = Some(dir);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results_to_show == 0 || self.max_results_to_show > 100 {
            return Err(invalid(
                "max_results_to_show",
                self.max_results_to_show,
                "must be between 1 and 100",
            ));
        }

        if self.selection_boost < 0 {
            return Err(invalid(
                "selection_boost",
                self.selection_boost,
                "must not be negative",
            ));
        }

        if self.refresh_cycle_ms == 0 {
            return Err(invalid("refresh_cycle_ms", 0, "must be positive"));
        }

        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", 0, "must be positive"));
        }

        if self.history_limit == 0 {
            return Err(invalid("history_limit", 0, "must be positive"));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: impl std::fmt::Display, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: format!("{} ({})", value, reason),
    }
}
