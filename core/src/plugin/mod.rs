//! Plugin system: the plugin trait, registry and query adapter

pub mod adapter;
pub mod base;
pub mod registry;

pub use adapter::{polish_results, query_plugin};
pub use base::{Plugin, PluginCommand, PluginFactory, PluginMetadata};
pub use registry::{PluginInstance, PluginRegistry};
