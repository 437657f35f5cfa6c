//! Query model
//!
//! A [`Query`] is built once per text change and never mutated afterwards.

pub mod builder;

pub use builder::{KeywordIndex, QueryBuilder};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trigger keyword that marks a plugin as global
pub const GLOBAL_TRIGGER_KEYWORD: &str = "*";

/// Monotonically increasing query identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryId(pub u64);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A parsed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    id: QueryId,
    raw: String,
    normalized: String,
    trigger_keyword: Option<String>,
    command: Option<String>,
    search: String,
}

impl Query {
    /// Build a query that ignores trigger keywords entirely
    pub fn plain<S: Into<String>>(id: QueryId, text: S) -> Self {
        QueryBuilder::new(&()).build(id, &text.into())
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Text exactly as typed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Terms joined by single spaces; used to scope pins and history
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn trigger_keyword(&self) -> Option<&str> {
        self.trigger_keyword.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Text after the trigger keyword and command
    pub fn search(&self) -> &str {
        &self.search
    }

    /// True when no trigger keyword scoped this query
    pub fn is_global(&self) -> bool {
        self.trigger_keyword.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Whitespace-delimited terms of the search text
    pub fn search_terms(&self) -> impl Iterator<Item = &str> {
        self.search.split_whitespace()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.id, self.raw)
    }
}
