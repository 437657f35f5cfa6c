//! # Wox Core
//!
//! Query orchestration core for the Wox launcher.
//!
//! Every keystroke becomes a [`Query`] that is fanned out to the eligible
//! plugins concurrently. Their batches are coalesced per refresh cycle and
//! merged into one ranked, identity-stable display list, while superseded
//! rounds are cancelled and never reach the display.

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod matcher;
pub mod plugin;
pub mod query;
pub mod result;
pub mod selection;
pub mod storage;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{DisplayEntry, DisplaySnapshot, ProgressState, ResultsUpdater, RoundHandle};
pub use error::{Error, Result};
pub use launcher::{Launcher, LauncherBuilder};
pub use logging::{init_tracing, init_tracing_with_debug, install_panic_hook};
pub use plugin::{Plugin, PluginFactory, PluginMetadata, PluginRegistry};
pub use query::{Query, QueryId};
pub use result::{
    ActionContext, ActionOutcome, Modifiers, RefreshedFields, ResultAction, ResultIdentity,
    ResultItem,
};
pub use selection::{ActiveList, SelectionState};
pub use storage::RecordStores;

/// Current version of the wox-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
