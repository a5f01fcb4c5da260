//! SQLite-backed alumni record store
//!
//! Each collection is one table of JSON documents. Timestamps are stored as
//! fixed-width RFC 3339 strings so that lexical order equals time order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::RecordStore;
use crate::types::AlumniRecord;

/// SQLite record store for one collection
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl SqliteRecordStore {
    /// Create or open the database at the given path
    pub fn open<P: AsRef<Path>>(path: P, collection: &str) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::store(format!("Failed to open database: {}", e)))?;

        Self::with_connection(conn, collection)
    }

    /// Create an in-memory database
    pub fn in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to open in-memory database: {}", e)))?;

        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> Result<Self> {
        let table = table_name(collection)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            table,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )
        .map_err(|e| Error::store(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                fields TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at);
            CREATE INDEX IF NOT EXISTS idx_{table}_updated_at ON {table}(updated_at);
            "#,
            table = self.table
        ))
        .map_err(|e| Error::store(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            op(&conn, &table)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, fields: Map<String, Value>) -> Result<AlumniRecord> {
        let record = AlumniRecord {
            id: Uuid::new_v4().to_string(),
            fields,
            created_at: Utc::now(),
            updated_at: None,
        };
        let fields_json = serde_json::to_string(&record.fields)?;
        let id = record.id.clone();
        let created_at = format_timestamp(&record.created_at);

        self.with_conn(move |conn, table| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (id, fields, created_at) VALUES (?1, ?2, ?3)",
                    table
                ),
                params![id, fields_json, created_at],
            )
            .map_err(|e| Error::store(format!("Insert failed: {}", e)))?;
            Ok(())
        })
        .await?;

        tracing::debug!("Inserted alumni record {}", record.id);
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<AlumniRecord>> {
        self.with_conn(|conn, table| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT id, fields, created_at, updated_at FROM {} ORDER BY seq",
                    table
                ))
                .map_err(|e| Error::store(format!("Query failed: {}", e)))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })
                .map_err(|e| Error::store(format!("Query failed: {}", e)))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, fields, created_at, updated_at) =
                    row.map_err(|e| Error::store(format!("Row read failed: {}", e)))?;
                match row_to_record(id, &fields, &created_at, updated_at.as_deref()) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("Skipping malformed alumni row: {}", e),
                }
            }
            Ok(records)
        })
        .await
    }

    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<String> = self
            .with_conn(|conn, table| {
                conn.query_row(
                    &format!(
                        "SELECT MAX(COALESCE(updated_at, created_at)) FROM {}",
                        table
                    ),
                    [],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()
                .map(Option::flatten)
                .map_err(|e| Error::store(format!("Timestamp probe failed: {}", e)))
            })
            .await?;

        latest.as_deref().map(parse_timestamp).transpose()
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn, table| {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(|e| Error::store(format!("Count failed: {}", e)))
        })
        .await
    }

    async fn ping(&self) -> Result<bool> {
        self.with_conn(|conn, _| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|one| one == 1)
                .map_err(|e| Error::store(format!("Ping failed: {}", e)))
        })
        .await
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// Map a collection name to a safe table identifier
fn table_name(collection: &str) -> Result<String> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !collection.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(format!("records_{}", collection))
    } else {
        Err(Error::Config(format!(
            "Collection name must be alphanumeric/underscore: {:?}",
            collection
        )))
    }
}

fn row_to_record(
    id: String,
    fields: &str,
    created_at: &str,
    updated_at: Option<&str>,
) -> Result<AlumniRecord> {
    Ok(AlumniRecord {
        id,
        fields: serde_json::from_str(fields)?,
        created_at: parse_timestamp(created_at)?,
        updated_at: updated_at.map(parse_timestamp).transpose()?,
    })
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::store(format!("Invalid timestamp {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_all() {
        let store = SqliteRecordStore::in_memory("alumni").unwrap();

        let first = store
            .insert(fields(json!({"name": "Arjun Sharma", "company": "Google"})))
            .await
            .unwrap();
        let second = store
            .insert(fields(json!({"name": "Priya Patel", "skills": ["Python", "R"]})))
            .await
            .unwrap();

        let records = store.find_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[1].id, second.id);
        assert_eq!(records[1].fields["skills"], json!(["Python", "R"]));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_latest_timestamp() {
        let store = SqliteRecordStore::in_memory("alumni").unwrap();
        assert!(store.latest_timestamp().await.unwrap().is_none());

        store.insert(fields(json!({"name": "A"}))).await.unwrap();
        let newest = store.insert(fields(json!({"name": "B"}))).await.unwrap();

        let latest = store.latest_timestamp().await.unwrap().unwrap();
        assert_eq!(format_timestamp(&latest), format_timestamp(&newest.created_at));
    }

    #[tokio::test]
    async fn test_reopen_persists_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alumni.sqlite");

        {
            let store = SqliteRecordStore::open(&path, "alumni").unwrap();
            store.insert(fields(json!({"name": "Rahul Krishnan"}))).await.unwrap();
        }

        let store = SqliteRecordStore::open(&path, "alumni").unwrap();
        let records = store.find_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), Some("Rahul Krishnan"));
        assert!(store.ping().await.unwrap());
    }

    #[test]
    fn test_collection_name_validation() {
        assert!(SqliteRecordStore::in_memory("alumni_2024").is_ok());
        assert!(matches!(
            SqliteRecordStore::in_memory("alumni; DROP TABLE x"),
            Err(Error::Config(_))
        ));
        assert!(SqliteRecordStore::in_memory("").is_err());
    }
}
