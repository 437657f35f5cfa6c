//! Built-in plugins shipped with the CLI

pub mod calculator;
pub mod system_commands;
pub mod web_search;

pub use calculator::CalculatorPluginFactory;
pub use system_commands::SystemCommandsFactory;
pub use web_search::{GoogleSearchFactory, YouTubeSearchFactory};

use wox_core::PluginFactory;

/// Factories for every built-in plugin, in registration order
pub fn builtin_factories() -> Vec<Box<dyn PluginFactory>> {
    vec![
        Box::new(CalculatorPluginFactory),
        Box::new(GoogleSearchFactory),
        Box::new(YouTubeSearchFactory),
        Box::new(SystemCommandsFactory),
    ]
}
