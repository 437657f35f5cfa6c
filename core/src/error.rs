//! Error types and handling for the Wox query core

use thiserror::Error;

/// Result type alias for Wox core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Wox core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plugin registration and invocation errors
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// Query dispatch and coalescer errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Persisted record errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// Plugin errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin not found: {id}")]
    NotFound { id: String },

    #[error("Plugin already registered: {id}")]
    DuplicateId { id: String },

    #[error("Invalid plugin metadata: {message}")]
    InvalidMetadata { message: String },

    #[error("Query failed in plugin {plugin}: {message}")]
    QueryFailed { plugin: String, message: String },

    #[error("Plugin {plugin} panicked: {message}")]
    Panicked { plugin: String, message: String },

    #[error("Action not found: {action}")]
    ActionNotFound { action: String },
}

/// Dispatch errors
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    #[error("Update queue is closed")]
    QueueClosed,

    #[error("Update loop terminated: {message}")]
    LoopFault { message: String },
}

/// Persistence errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to load records from {path}: {message}")]
    LoadFailed { path: String, message: String },

    #[error("Failed to save records to {path}: {message}")]
    SaveFailed { path: String, message: String },
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
