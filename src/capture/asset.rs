//! Captured asset records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One media-library asset, in export shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub asset_id: String,
    pub filename: String,
    pub tags: Vec<String>,
    pub width: u64,
    pub height: u64,
}

/// Records unique by asset id, in first-seen order.
///
/// A later sighting of the same id replaces the record in place.
#[derive(Debug, Default)]
pub struct AssetStore {
    records: Vec<AssetRecord>,
    index: HashMap<String, usize>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns true when the id was new.
    pub fn upsert(&mut self, record: AssetRecord) -> bool {
        match self.index.get(&record.asset_id) {
            Some(&slot) => {
                self.records[slot] = record;
                false
            }
            None => {
                self.index.insert(record.asset_id.clone(), self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
