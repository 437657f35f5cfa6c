//! Counts of how often each logical result was chosen

use crate::result::ResultIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// On-disk form of one selection count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionCount {
    pub identity: ResultIdentity,
    pub count: u32,
}

/// Selection counts keyed by result identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SelectionCount>", into = "Vec<SelectionCount>")]
pub struct UserSelectedRecord {
    counts: HashMap<ResultIdentity, u32>,
}

impl From<Vec<SelectionCount>> for UserSelectedRecord {
    fn from(entries: Vec<SelectionCount>) -> Self {
        let mut record = Self::default();
        for entry in entries {
            *record.counts.entry(entry.identity).or_default() += entry.count;
        }
        record
    }
}

impl From<UserSelectedRecord> for Vec<SelectionCount> {
    fn from(record: UserSelectedRecord) -> Self {
        let mut entries: Vec<SelectionCount> = record
            .counts
            .into_iter()
            .map(|(identity, count)| SelectionCount { identity, count })
            .collect();
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));
        entries
    }
}

impl UserSelectedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one selection of `identity`
    pub fn add(&mut self, identity: &ResultIdentity) {
        let count = self.counts.entry(identity.clone()).or_default();
        *count = count.saturating_add(1);
    }

    pub fn count(&self, identity: &ResultIdentity) -> u32 {
        self.counts.get(identity).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_scoped_by_plugin() {
        let mut record = UserSelectedRecord::new();
        let chrome = ResultIdentity::new("programs", "chrome");
        record.add(&chrome);
        record.add(&chrome);

        assert_eq!(record.count(&chrome), 2);
        assert_eq!(record.count(&ResultIdentity::new("bookmarks", "chrome")), 0);
    }

    #[test]
    fn test_json_shape() {
        let mut record = UserSelectedRecord::new();
        record.add(&ResultIdentity::new("programs", "chrome"));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["count"], 1);

        let restored: UserSelectedRecord = serde_json::from_value(json).unwrap();
        assert_eq!(restored, record);
    }
}
