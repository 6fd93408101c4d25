use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;
use veriface_types::{ResultRecord, TriggerMode};

/// Outcome of [`ResultStore::add_result`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted,
    Updated,
}

/// Ordered result list keyed by record id.
///
/// Storage order is insertion order. Replacing a record keeps its slot.
#[derive(Debug, Default)]
pub struct ResultStore {
    records: Vec<ResultRecord>,
    index: HashMap<Uuid, usize>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record with the same id in place, or append it
    pub fn add_result(&mut self, record: ResultRecord) -> Merge {
        match self.index.get(&record.id) {
            Some(&pos) => {
                self.records[pos] = record;
                Merge::Updated
            }
            None => {
                self.index.insert(record.id, self.records.len());
                self.records.push(record);
                Merge::Inserted
            }
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&ResultRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn position(&self, id: &Uuid) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ResultRecord> {
        self.records.iter()
    }

    /// Display order: most recent first
    pub fn latest_first(&self) -> Vec<ResultRecord> {
        self.records.iter().rev().cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_pending()).count()
    }
}

/// The manual and auto result lists of one session.
#[derive(Debug, Default)]
pub struct ResultStores {
    manual: RwLock<ResultStore>,
    auto: RwLock<ResultStore>,
}

impl ResultStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_mode(&self, mode: TriggerMode) -> &RwLock<ResultStore> {
        match mode {
            TriggerMode::Manual => &self.manual,
            TriggerMode::Auto => &self.auto,
        }
    }

    /// Merge `record` into the store for `mode` and return that store in display order
    pub async fn add_result(&self, mode: TriggerMode, record: ResultRecord) -> Vec<ResultRecord> {
        let mut store = self.for_mode(mode).write().await;
        let merge = store.add_result(record);
        tracing::debug!("[STORE] {mode} {merge:?}, {} records", store.len());
        store.latest_first()
    }

    pub async fn snapshot(&self, mode: TriggerMode) -> Vec<ResultRecord> {
        self.for_mode(mode).read().await.latest_first()
    }
}
