//! Record store provider trait for the alumni collection

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::AlumniRecord;

/// Trait for the document store holding alumni records
///
/// Implementations:
/// - `SqliteRecordStore`: JSON documents in a SQLite table
/// - `MemoryRecordStore`: in-process store for tests and demos
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record, assigning its id and creation time
    async fn insert(&self, fields: Map<String, Value>) -> Result<AlumniRecord>;

    /// All records in insertion order
    async fn find_all(&self) -> Result<Vec<AlumniRecord>>;

    /// Newest `updated_at` (falling back to `created_at`) across the collection
    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>>;

    /// Number of records
    async fn count(&self) -> Result<usize>;

    /// Check that the store answers queries
    async fn ping(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
