//! Persisted usage records: query history, selection counts and top-most pins

pub mod history;
pub mod json_store;
pub mod top_most;
pub mod user_selected;

pub use history::{HistoryItem, QueryHistory, DEFAULT_HISTORY_LIMIT};
pub use json_store::RecordStore;
pub use top_most::{TopMostPin, TopMostRecord};
pub use user_selected::UserSelectedRecord;

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub const HISTORY_FILE_NAME: &str = "query_history.json";
pub const USER_SELECTED_FILE_NAME: &str = "user_selected.json";
pub const TOP_MOST_FILE_NAME: &str = "top_most.json";

/// Handles to the three record stores
#[derive(Clone)]
pub struct RecordStores {
    pub history: RecordStore<QueryHistory>,
    pub user_selected: RecordStore<UserSelectedRecord>,
    pub top_most: RecordStore<TopMostRecord>,
}

impl RecordStores {
    /// Stores that live only for the process lifetime
    pub fn in_memory() -> Self {
        Self {
            history: RecordStore::in_memory(QueryHistory::new()),
            user_selected: RecordStore::in_memory(UserSelectedRecord::new()),
            top_most: RecordStore::in_memory(TopMostRecord::new()),
        }
    }

    /// Load all stores from `dir`
    pub async fn load<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let stores = Self {
            history: RecordStore::load(dir.join(HISTORY_FILE_NAME)).await,
            user_selected: RecordStore::load(dir.join(USER_SELECTED_FILE_NAME)).await,
            top_most: RecordStore::load(dir.join(TOP_MOST_FILE_NAME)).await,
        };
        info!(
            "Loaded records from {}: {} history items, {} selection counts, {} pins",
            dir.display(),
            stores.history.read(QueryHistory::len),
            stores.user_selected.read(UserSelectedRecord::len),
            stores.top_most.read(|r| r.pins().len()),
        );
        stores
    }

    /// Default storage directory under the platform data dir
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("wox");
        path
    }

    /// Save every dirty store
    pub async fn save_all(&self) -> Result<()> {
        self.history.save().await?;
        self.user_selected.save().await?;
        self.top_most.save().await?;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty() || self.user_selected.is_dirty() || self.top_most.is_dirty()
    }
}
