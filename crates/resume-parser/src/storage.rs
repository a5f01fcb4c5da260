//! SQLite storage for parsed resumes
//!
//! Rows are deduplicated on a content hash and on email; list columns are
//! stored as JSON text.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::ParsedResume;

/// A saved resume row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResume {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<Value>,
    pub projects: Vec<Value>,
    pub education: Vec<Value>,
    pub courses: Vec<Value>,
    pub social_media: Map<String, Value>,
    pub resume_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Result of saving a parsed resume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Inserted { id: i64 },
    Duplicate { hash: String },
}

/// Dedup hash: SHA-256 of email, phone and the JSON skill list
pub fn resume_hash(resume: &ParsedResume) -> Result<String> {
    let skills = serde_json::to_string(&resume.skills)?;
    let mut hasher = Sha256::new();
    hasher.update(resume.email.as_deref().unwrap_or("").as_bytes());
    hasher.update(resume.phone.as_deref().unwrap_or("").as_bytes());
    hasher.update(skills.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Parsed resume database
#[derive(Clone)]
pub struct ResumeDb {
    conn: Arc<Mutex<Connection>>,
}

impl ResumeDb {
    /// Create or open the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::storage(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS alumni (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                phone TEXT,
                skills TEXT NOT NULL,
                experience TEXT NOT NULL,
                projects TEXT NOT NULL,
                education TEXT NOT NULL,
                courses TEXT NOT NULL,
                social_media TEXT NOT NULL,
                resume_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| Error::storage(format!("Failed to create tables: {}", e)))?;
        Ok(())
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            op(&conn)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    /// Insert a parsed resume unless an identical one (or one with the same email) exists
    pub async fn save(&self, resume: &ParsedResume) -> Result<SaveOutcome> {
        let hash = resume_hash(resume)?;
        let name = resume.name.clone().unwrap_or_else(|| "Unknown".to_string());
        let email = resume.email.clone();
        let phone = resume.phone.clone();
        let skills = serde_json::to_string(&resume.skills)?;
        let experience = serde_json::to_string(&resume.experience)?;
        let projects = serde_json::to_string(&resume.projects)?;
        let education = serde_json::to_string(&resume.education)?;
        let courses = serde_json::to_string(&resume.courses)?;
        let social_media = serde_json::to_string(&resume.social_media)?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let row_hash = hash.clone();

        let inserted = self
            .with_conn(move |conn| {
                let changed = conn.execute(
                    r#"
                    INSERT OR IGNORE INTO alumni
                        (name, email, phone, skills, experience, projects, education,
                         courses, social_media, resume_hash, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    "#,
                    params![
                        name,
                        email,
                        phone,
                        skills,
                        experience,
                        projects,
                        education,
                        courses,
                        social_media,
                        row_hash,
                        created_at
                    ],
                )?;
                Ok((changed > 0).then(|| conn.last_insert_rowid()))
            })
            .await?;

        match inserted {
            Some(id) => {
                tracing::info!("Saved resume {} (hash {})", id, &hash[..12]);
                Ok(SaveOutcome::Inserted { id })
            }
            None => {
                tracing::info!("Duplicate resume skipped (hash {})", &hash[..12]);
                Ok(SaveOutcome::Duplicate { hash })
            }
        }
    }

    /// All stored resumes, newest first
    pub async fn list_all(&self) -> Result<Vec<StoredResume>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM alumni ORDER BY created_at DESC, id DESC",
            )?;
            let resumes = stmt
                .query_map([], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(resumes)
        })
        .await
    }

    /// Look up a resume by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<StoredResume>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT * FROM alumni WHERE email = ?1",
                params![email],
                read_row,
            )
            .optional()
            .map_err(Error::from)
        })
        .await
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredResume> {
    let created_at: String = row.get("created_at")?;
    Ok(StoredResume {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        skills: decode_or_default(row.get("skills")?),
        experience: decode_or_default(row.get("experience")?),
        projects: decode_or_default(row.get("projects")?),
        education: decode_or_default(row.get("education")?),
        courses: decode_or_default(row.get("courses")?),
        social_media: decode_or_default(row.get("social_media")?),
        resume_hash: row.get("resume_hash")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_default(),
    })
}

/// Malformed JSON columns read back as empty
fn decode_or_default<T: serde::de::DeserializeOwned + Default>(raw: String) -> T {
    serde_json::from_str(&raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resume(email: Option<&str>, skills: &[&str]) -> ParsedResume {
        ParsedResume {
            name: Some("John Doe".into()),
            email: email.map(str::to_string),
            phone: Some("555-0100".into()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            education: vec![json!({"degree": "BSc"})],
            ..Default::default()
        }
    }

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let a = resume_hash(&resume(Some("a@example.com"), &["Python"])).unwrap();
        let b = resume_hash(&resume(Some("a@example.com"), &["Python"])).unwrap();
        let c = resume_hash(&resume(Some("a@example.com"), &["Rust"])).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_save_and_dedupe() {
        let db = ResumeDb::in_memory().unwrap();
        let first = db.save(&resume(Some("a@example.com"), &["Python"])).await.unwrap();
        assert!(matches!(first, SaveOutcome::Inserted { .. }));

        let again = db.save(&resume(Some("a@example.com"), &["Python"])).await.unwrap();
        assert!(matches!(again, SaveOutcome::Duplicate { .. }));

        // same email, different content
        let same_email = db.save(&resume(Some("a@example.com"), &["Go"])).await.unwrap();
        assert!(matches!(same_email, SaveOutcome::Duplicate { .. }));

        assert_eq!(db.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_email_and_name() {
        let db = ResumeDb::in_memory().unwrap();
        let mut anonymous = resume(None, &["Python"]);
        anonymous.name = None;
        db.save(&anonymous).await.unwrap();
        db.save(&resume(None, &["Rust"])).await.unwrap();

        let all = db.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|r| r.name == "Unknown"));
        assert!(all.iter().all(|r| r.email.is_none()));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_lookup() {
        let db = ResumeDb::in_memory().unwrap();
        db.save(&resume(Some("first@example.com"), &["Python"])).await.unwrap();
        db.save(&resume(Some("second@example.com"), &["Rust"])).await.unwrap();

        let all = db.list_all().await.unwrap();
        assert_eq!(all[0].email.as_deref(), Some("second@example.com"));
        assert_eq!(all[1].skills, vec!["Python"]);
        assert_eq!(all[1].education[0]["degree"], "BSc");

        let found = db.get_by_email("first@example.com").await.unwrap().unwrap();
        assert_eq!(found.name, "John Doe");
        assert!(db.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("alumni.db");
        {
            let db = ResumeDb::open(&path).unwrap();
            db.save(&resume(Some("a@example.com"), &["Python"])).await.unwrap();
        }
        let reopened = ResumeDb::open(&path).unwrap();
        assert_eq!(reopened.list_all().await.unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_json_column() {
        let skills: Vec<String> = decode_or_default("not json".to_string());
        assert!(skills.is_empty());
        let social: Map<String, Value> = decode_or_default("[1,2]".to_string());
        assert!(social.is_empty());
    }
}
