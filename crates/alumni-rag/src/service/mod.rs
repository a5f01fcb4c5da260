//! Conversational answering over the alumni index
//!
//! [`AlumniRagService`] ties together the record store, the index manager,
//! the chat model and per-session history. It is constructed once with its
//! dependencies injected and shared behind an `Arc`.

pub mod freshness;
pub mod refresh;
pub mod sessions;

pub use freshness::Watermark;
pub use refresh::{spawn_refresher, IndexRefresher, RefreshHandle};
pub use sessions::SessionStore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::config::{RagConfig, RefreshMode};
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::index::{IndexManager, IndexState, SnapshotStore};
use crate::projection::project;
use crate::providers::{EmbeddingProvider, GenerationOptions, LlmProvider, RecordStore};
use crate::types::{ChatTurn, ComponentStatus, NewAlumni};

/// Answer returned when any step of answering fails
pub const APOLOGY: &str = "Sorry, I encountered an error processing your question.";

/// Outcome of [`AlumniRagService::answer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub success: bool,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a full rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Records read from the store
    pub records: usize,
    /// Generation of the published index
    pub generation: u64,
    /// Whether the new snapshot reached disk
    pub persisted: bool,
}

/// Component health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub store: ComponentStatus,
    pub index: ComponentStatus,
    pub record_count: usize,
    pub session_count: usize,
}

impl HealthReport {
    /// Healthy only when every component is
    pub fn status(&self) -> ComponentStatus {
        ComponentStatus::from_bool(self.store.is_healthy() && self.index.is_healthy())
    }
}

/// Alumni question-answering service
pub struct AlumniRagService {
    store: Arc<dyn RecordStore>,
    llm: Arc<dyn LlmProvider>,
    index: IndexManager,
    sessions: SessionStore,
    watermark: Watermark,
    refresh_signal: Notify,
    config: RagConfig,
}

impl AlumniRagService {
    /// Create the service; snapshots are kept on disk when `index.persist` is set
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        config: RagConfig,
    ) -> Self {
        let snapshots = config
            .index
            .persist
            .then(|| SnapshotStore::new(config.snapshot_dir()));
        let index = IndexManager::new(embedder, snapshots, config.embeddings.batch_size);

        Self {
            store,
            llm,
            index,
            sessions: SessionStore::new(),
            watermark: Watermark::new(),
            refresh_signal: Notify::new(),
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    pub(crate) fn refresh_signal(&self) -> &Notify {
        &self.refresh_signal
    }

    /// Load the persisted index, falling back to a rebuild from the store
    pub async fn initialize(&self) -> Result<()> {
        match self.index.load().await {
            Ok(true) => {
                // the snapshot carries no watermark, so the first freshness check refreshes it
                return Ok(());
            }
            Ok(false) => tracing::info!("No usable index snapshot, building from the store"),
            Err(e) => tracing::warn!("Failed to load index snapshot, rebuilding: {}", e),
        }

        self.rebuild().await.map(|_| ())
    }

    /// Answer a question within a session.
    ///
    /// Never fails: errors are logged and reported in the outcome.
    pub async fn answer(&self, question: &str, session_id: &str) -> AnswerOutcome {
        match self.try_answer(question, session_id).await {
            Ok(answer) => AnswerOutcome {
                success: true,
                answer,
                error: None,
            },
            Err(e) => {
                tracing::error!("Error processing query: {}", e);
                AnswerOutcome {
                    success: false,
                    answer: APOLOGY.to_string(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_answer(&self, question: &str, session_id: &str) -> Result<String> {
        self.ensure_fresh().await?;

        let retriever = self
            .index
            .retriever()
            .ok_or_else(|| Error::Index("No index has been built".to_string()))?;
        let documents = retriever
            .retrieve(question, self.config.retrieval.top_k)
            .await?;
        tracing::debug!(
            "Retrieved {} documents from index generation {}",
            documents.len(),
            retriever.generation()
        );

        let history = self.sessions.history(session_id);
        let messages = PromptBuilder::build_messages(question, &documents, &history);

        let limit = self.config.llm.timeout_secs;
        let answer = timeout(
            Duration::from_secs(limit),
            self.llm.chat(&messages, &GenerationOptions::default()),
        )
        .await
        .map_err(|_| Error::Timeout(limit))??;

        self.sessions.record_exchange(session_id, question, &answer);
        Ok(answer)
    }

    /// Bring the index up to date according to the refresh mode.
    ///
    /// An absent index is always built inline.
    async fn ensure_fresh(&self) -> Result<()> {
        if self.index.state() == IndexState::Absent {
            self.rebuild().await?;
            return Ok(());
        }

        match self.config.refresh.mode {
            RefreshMode::Inline => {
                self.refresh_if_stale().await?;
            }
            RefreshMode::Background => {
                let latest = self.store.latest_timestamp().await?;
                if self.watermark.is_stale(latest) {
                    tracing::debug!("Index is stale, waking the refresher");
                    self.refresh_signal.notify_one();
                }
            }
        }
        Ok(())
    }

    /// Rebuild if the store holds records newer than the watermark
    pub async fn refresh_if_stale(&self) -> Result<bool> {
        let latest = self.store.latest_timestamp().await?;
        if !self.watermark.is_stale(latest) {
            return Ok(false);
        }
        self.rebuild().await?;
        Ok(true)
    }

    /// Rebuild the index from every record in the store
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        // read under the writer lock so a concurrent append cannot be overwritten
        let (update, (records, newest)) = self
            .index
            .rebuild_with(|| async {
                let records = self.store.find_all().await?;
                let newest = records.iter().map(|r| r.freshness()).max();
                let documents: Vec<String> = records.iter().map(|r| project(&r.fields)).collect();
                Ok((documents, (records.len(), newest)))
            })
            .await?;
        if let Some(newest) = newest {
            self.watermark.advance(newest);
        }

        Ok(RebuildReport {
            records,
            generation: update.generation,
            persisted: update.persisted,
        })
    }

    /// Insert a record and make it searchable; returns the new record id.
    ///
    /// If the snapshot cannot be written the record stays searchable in
    /// memory and reaches disk with the next successful persist.
    pub async fn add_record_and_index(&self, new: NewAlumni) -> Result<String> {
        new.validate()?;
        let fields = new.into_fields()?;

        let was_fresh = match self.store.latest_timestamp().await {
            Ok(latest) => !self.watermark.is_stale(latest),
            Err(_) => false,
        };

        let record = self.store.insert(fields).await?;
        tracing::info!("Added alumni with ID: {}", record.id);

        let update = self.index.append(project(&record.fields)).await?;
        if !update.persisted && self.config.index.persist {
            tracing::warn!(
                "Alumni {} is searchable but the index snapshot was not saved",
                record.id
            );
        }

        // records written by others since the last rebuild keep the index stale
        if was_fresh {
            self.watermark.advance(record.freshness());
        }

        Ok(record.id)
    }

    /// Conversation turns of a session
    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.sessions.history(session_id)
    }

    /// Drop a session; returns whether it existed
    pub fn clear(&self, session_id: &str) -> bool {
        let cleared = self.sessions.clear(session_id);
        if cleared {
            tracing::info!("Cleared conversation for session: {}", session_id);
        }
        cleared
    }

    /// Probe the store and the index
    pub async fn health(&self) -> HealthReport {
        let store_ok = match self.store.ping().await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("Record store ping failed: {}", e);
                false
            }
        };

        let index_ok = match self.index.retrieve("test", 1).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Index probe failed: {}", e);
                false
            }
        };

        let record_count = match self.store.count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Failed to count records: {}", e);
                0
            }
        };

        HealthReport {
            store: ComponentStatus::from_bool(store_ok),
            index: ComponentStatus::from_bool(index_ok),
            record_count,
            session_count: self.sessions.len(),
        }
    }
}
