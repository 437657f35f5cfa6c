//! Configuration module for the Wox core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{EngineConfig, DISPLAY_CAP_FACTOR};
