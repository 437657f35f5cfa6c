//! Results pinned to the top of the list

use crate::result::ResultIdentity;
use serde::{Deserialize, Serialize};

/// One pin; a `None` query pins the result for every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopMostPin {
    pub query: Option<String>,
    pub identity: ResultIdentity,
}

/// Set of pinned results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopMostRecord {
    pins: Vec<TopMostPin>,
}

impl TopMostRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `identity` is pinned for the exact query text
    pub fn is_top_most(&self, query: &str, identity: &ResultIdentity) -> bool {
        self.pins.iter().any(|pin| {
            pin.identity == *identity && pin.query.as_deref().map_or(true, |q| q == query)
        })
    }

    /// Whether a pin with exactly this scope exists
    pub fn has_pin(&self, query: Option<&str>, identity: &ResultIdentity) -> bool {
        self.pins
            .iter()
            .any(|pin| pin.identity == *identity && pin.query.as_deref() == query)
    }

    /// Pin `identity`; no-op if the same pin already exists
    pub fn add(&mut self, query: Option<&str>, identity: ResultIdentity) {
        if !self.has_pin(query, &identity) {
            self.pins.push(TopMostPin {
                query: query.map(str::to_string),
                identity,
            });
        }
    }

    /// Remove the pin with exactly this scope; returns whether one was removed
    pub fn remove(&mut self, query: Option<&str>, identity: &ResultIdentity) -> bool {
        let before = self.pins.len();
        self.pins
            .retain(|pin| !(pin.identity == *identity && pin.query.as_deref() == query));
        self.pins.len() != before
    }

    pub fn pins(&self) -> &[TopMostPin] {
        &self.pins
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_pin_matches_exact_query_only() {
        let mut record = TopMostRecord::new();
        let id = ResultIdentity::new("programs", "terminal");
        record.add(Some("term"), id.clone());

        assert!(record.is_top_most("term", &id));
        assert!(!record.is_top_most("ter", &id));
        assert!(!record.is_top_most("term", &ResultIdentity::new("files", "terminal")));
    }

    #[test]
    fn test_unscoped_pin_matches_any_query() {
        let mut record = TopMostRecord::new();
        let id = ResultIdentity::new("programs", "terminal");
        record.add(None, id.clone());
        assert!(record.is_top_most("anything", &id));
    }

    #[test]
    fn test_add_is_idempotent_and_remove() {
        let mut record = TopMostRecord::new();
        let id = ResultIdentity::new("programs", "terminal");
        record.add(Some("t"), id.clone());
        record.add(Some("t"), id.clone());
        assert_eq!(record.pins().len(), 1);

        assert!(!record.remove(None, &id));
        assert!(record.remove(Some("t"), &id));
        assert!(record.is_empty());
    }
}
