//! In-process record store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::RecordStore;
use crate::types::AlumniRecord;

/// Record store kept entirely in memory
///
/// `set_available(false)` makes every operation fail the way an unreachable
/// database would.
pub struct MemoryRecordStore {
    records: RwLock<Vec<AlumniRecord>>,
    available: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated connectivity
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Insert a fully formed record (fixed timestamps for tests)
    pub fn push(&self, record: AlumniRecord) {
        self.records.write().push(record);
    }

    fn check(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::store("connection refused"))
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, fields: Map<String, Value>) -> Result<AlumniRecord> {
        self.check()?;
        let record = AlumniRecord {
            id: Uuid::new_v4().to_string(),
            fields,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.records.write().push(record.clone());
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<AlumniRecord>> {
        self.check()?;
        Ok(self.records.read().clone())
    }

    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        self.check()?;
        Ok(self.records.read().iter().map(AlumniRecord::freshness).max())
    }

    async fn count(&self) -> Result<usize> {
        self.check()?;
        Ok(self.records.read().len())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryRecordStore::new();
        store.insert(Map::new()).await.unwrap();

        store.set_available(false);
        assert!(!store.ping().await.unwrap());
        assert!(matches!(store.count().await, Err(Error::Store(_))));

        store.set_available(true);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
