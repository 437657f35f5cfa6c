//! CLI command implementations

pub mod history;
pub mod interactive;
pub mod plugins;
pub mod query;

pub use history::history_command;
pub use interactive::interactive_command;
pub use plugins::plugins_command;
pub use query::query_command;

use crate::plugins::builtin_factories;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error};
use wox_core::engine::FatalHook;
use wox_core::error::DispatchError;
use wox_core::{EngineConfig, Launcher};

/// Start a launcher with every built-in plugin registered
pub async fn build_launcher(config: EngineConfig) -> Result<Launcher> {
    if let Some(dir) = &config.storage_dir {
        debug!("Using storage directory {}", dir.display());
    }

    let fatal: FatalHook = Arc::new(|fault: &DispatchError| {
        error!("Result updates stopped: {}", fault);
        eprintln!("Result updates stopped: {}", fault);
    });

    let mut builder = Launcher::builder(config).on_fatal(fatal);
    for factory in builtin_factories() {
        builder = builder.with_factory(factory.as_ref());
    }

    builder.build().await.context("Failed to start launcher")
}
