//! Sample data loading

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::RecordStore;

/// Read a JSON array of alumni objects
pub fn load_seed_file(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let raw = std::fs::read_to_string(path)?;
    parse_seed(&raw)
}

fn parse_seed(raw: &str) -> Result<Vec<Map<String, Value>>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(Error::validation("seed file must contain a JSON array"));
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map),
            other => tracing::warn!("Skipping seed entry {}: not an object ({})", i, other),
        }
    }
    Ok(records)
}

/// Insert the seed records when the collection is empty
///
/// Returns the number of records inserted.
pub async fn seed_if_empty(store: &dyn RecordStore, path: &Path) -> Result<usize> {
    let existing = store.count().await?;
    if existing > 0 {
        tracing::info!(
            "Collection already holds {} records, skipping seed {}",
            existing,
            path.display()
        );
        return Ok(0);
    }

    let records = load_seed_file(path)?;
    let total = records.len();
    for fields in records {
        store.insert(fields).await?;
    }
    tracing::info!("Seeded {} alumni records from {}", total, path.display());
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRecordStore;

    #[test]
    fn test_parse_seed_skips_non_objects() {
        let records = parse_seed(r#"[{"name": "A"}, 3, {"name": "B"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert!(parse_seed(r#"{"name": "A"}"#).is_err());
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"[{"name": "A"}, {"name": "B"}]"#).unwrap();

        let store = MemoryRecordStore::new();
        assert_eq!(seed_if_empty(&store, &path).await.unwrap(), 2);
        assert_eq!(seed_if_empty(&store, &path).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
