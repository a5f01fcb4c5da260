//! Index lifecycle: build, publish, persist, load, append and retrieve
//!
//! Readers take a [`Retriever`] holding an `Arc` of the snapshot that was
//! published when it was acquired, so they never wait on a rebuild. Writers
//! (rebuilds and appends) are serialized by an async mutex and publish by
//! swapping the `Arc`.

use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

use super::snapshot::SnapshotStore;
use super::{IndexEntry, ScoredDocument, VectorIndex, PLACEHOLDER_TEXT};

/// Whether a snapshot has been published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Absent,
    Loaded,
}

/// Result of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexUpdate {
    /// Generation of the newly published snapshot
    pub generation: u64,
    /// Entries in the new snapshot
    pub entries: usize,
    /// Whether the snapshot reached disk
    pub persisted: bool,
}

/// Read handle on one published snapshot
#[derive(Clone)]
pub struct Retriever {
    snapshot: Arc<VectorIndex>,
    generation: u64,
    latest: Arc<AtomicU64>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Embed the query and return the `k` most similar documents
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let embedding = self.embedder.embed(query).await?;
        Ok(self.snapshot.search(&embedding, k))
    }

    /// Generation this handle was acquired at
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer snapshot has been published
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }

    pub fn snapshot(&self) -> &Arc<VectorIndex> {
        &self.snapshot
    }
}

/// Owner of the published snapshot
pub struct IndexManager {
    embedder: Arc<dyn EmbeddingProvider>,
    published: RwLock<Option<Arc<VectorIndex>>>,
    generation: Arc<AtomicU64>,
    write_lock: Mutex<()>,
    store: Option<SnapshotStore>,
    batch_size: usize,
}

impl IndexManager {
    /// Create a manager; `store` enables on-disk snapshots
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Option<SnapshotStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            published: RwLock::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            write_lock: Mutex::new(()),
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub fn state(&self) -> IndexState {
        if self.published.read().is_some() {
            IndexState::Loaded
        } else {
            IndexState::Absent
        }
    }

    /// Generation of the published snapshot (0 before the first publish)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Currently published snapshot
    pub fn current(&self) -> Option<Arc<VectorIndex>> {
        self.published.read().clone()
    }

    /// Read handle on the current snapshot
    pub fn retriever(&self) -> Option<Retriever> {
        let published = self.published.read();
        let snapshot = published.as_ref()?;
        Some(Retriever {
            snapshot: Arc::clone(snapshot),
            generation: self.generation.load(Ordering::Acquire),
            latest: Arc::clone(&self.generation),
            embedder: Arc::clone(&self.embedder),
        })
    }

    /// Retrieve from the current snapshot
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let retriever = self
            .retriever()
            .ok_or_else(|| Error::Index("No index has been built".to_string()))?;
        retriever.retrieve(query, k).await
    }

    /// Embed documents into a new, unpublished index.
    ///
    /// An empty input yields the placeholder index.
    pub async fn build_from(&self, documents: Vec<String>) -> Result<VectorIndex> {
        let model = self.embedder.model().to_string();
        let dimensions = self.embedder.dimensions();

        if documents.is_empty() {
            let embedding = self.embed_checked(PLACEHOLDER_TEXT).await?;
            return Ok(VectorIndex::placeholder(model, dimensions, embedding));
        }

        let mut entries = Vec::with_capacity(documents.len());
        for batch in documents.chunks(self.batch_size) {
            let embeddings = self.embedder.embed_batch(batch).await?;
            if embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} embeddings for {} documents",
                    self.embedder.name(),
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (text, embedding) in batch.iter().zip(embeddings) {
                check_dimensions(&embedding, dimensions)?;
                entries.push(IndexEntry {
                    text: text.clone(),
                    embedding,
                });
            }
        }

        Ok(VectorIndex::new(model, dimensions, entries))
    }

    /// Build from `documents` and publish the result
    pub async fn rebuild(&self, documents: Vec<String>) -> Result<IndexUpdate> {
        let (update, ()) = self
            .rebuild_with(|| async move { Ok((documents, ())) })
            .await?;
        Ok(update)
    }

    /// Fetch documents and rebuild from them while holding the writer lock.
    ///
    /// An append that starts during the fetch waits for the new snapshot and
    /// lands on top of it. `fetch` may return extra data alongside the
    /// documents, handed back with the update.
    pub async fn rebuild_with<F, Fut, T>(&self, fetch: F) -> Result<(IndexUpdate, T)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(Vec<String>, T)>>,
    {
        let _guard = self.write_lock.lock().await;

        let (documents, extra) = fetch().await?;
        let count = documents.len();
        let index = self.build_from(documents).await?;
        tracing::info!("Rebuilt index from {} documents", count);
        Ok((self.publish_and_persist(index).await, extra))
    }

    /// Embed one document and publish a snapshot with it appended
    pub async fn append(&self, document: String) -> Result<IndexUpdate> {
        let _guard = self.write_lock.lock().await;

        let index = match self.current() {
            Some(current) => {
                let embedding = self.embed_checked(&document).await?;
                current.with_entry(IndexEntry {
                    text: document,
                    embedding,
                })
            }
            None => self.build_from(vec![document]).await?,
        };
        Ok(self.publish_and_persist(index).await)
    }

    /// Load the published on-disk snapshot.
    ///
    /// Returns `Ok(false)` when there is nothing usable: no snapshot, or one
    /// built with a different embedding model.
    pub async fn load(&self) -> Result<bool> {
        let store = match &self.store {
            Some(store) => store.clone(),
            None => return Ok(false),
        };

        let _guard = self.write_lock.lock().await;

        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let index = match loaded {
            Some(index) => index,
            None => return Ok(false),
        };

        if index.model() != self.embedder.model() || index.dimensions() != self.embedder.dimensions()
        {
            tracing::warn!(
                "Ignoring snapshot built with {} ({} dims), current embedder is {} ({} dims)",
                index.model(),
                index.dimensions(),
                self.embedder.model(),
                self.embedder.dimensions()
            );
            return Ok(false);
        }

        tracing::info!("Loaded index snapshot with {} entries", index.len());
        self.publish(index);
        Ok(true)
    }

    /// Write the current snapshot to disk
    pub async fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match self.current() {
            Some(index) => self.persist_snapshot(index).await,
            None => Ok(()),
        }
    }

    fn publish(&self, index: VectorIndex) -> u64 {
        let mut published = self.published.write();
        *published = Some(Arc::new(index));
        // bumped while the write guard is held; retriever() reads both under the read guard
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    async fn publish_and_persist(&self, index: VectorIndex) -> IndexUpdate {
        let entries = index.len();
        let generation = self.publish(index);

        let persisted = match (&self.store, self.current()) {
            (Some(_), Some(snapshot)) => match self.persist_snapshot(snapshot).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(
                        "Index generation {} is live but not on disk: {}",
                        generation,
                        e
                    );
                    false
                }
            },
            _ => false,
        };

        IndexUpdate {
            generation,
            entries,
            persisted,
        }
    }

    async fn persist_snapshot(&self, index: Arc<VectorIndex>) -> Result<()> {
        let store = match &self.store {
            Some(store) => store.clone(),
            None => return Ok(()),
        };

        tokio::task::spawn_blocking(move || store.publish(&index))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;
        Ok(())
    }

    async fn embed_checked(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.embedder.embed(text).await?;
        check_dimensions(&embedding, self.embedder.dimensions())?;
        Ok(embedding)
    }
}

fn check_dimensions(embedding: &[f32], expected: usize) -> Result<()> {
    if embedding.len() != expected {
        return Err(Error::embedding(format!(
            "Embedding has {} dimensions, expected {}",
            embedding.len(),
            expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashingEmbedder;
    use tempfile::TempDir;

    fn manager(store: Option<SnapshotStore>) -> IndexManager {
        IndexManager::new(Arc::new(HashingEmbedder::new(64)), store, 2)
    }

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_starts_absent() {
        let manager = manager(None);
        assert_eq!(manager.state(), IndexState::Absent);
        assert!(manager.retriever().is_none());
        assert!(matches!(manager.retrieve("test", 5).await, Err(Error::Index(_))));
    }

    #[tokio::test]
    async fn test_empty_rebuild_publishes_placeholder() {
        let manager = manager(None);
        let update = manager.rebuild(Vec::new()).await.unwrap();

        assert_eq!(update.entries, 1);
        assert_eq!(manager.state(), IndexState::Loaded);
        let results = manager.retrieve("anything", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, PLACEHOLDER_TEXT);
    }

    #[tokio::test]
    async fn test_append_is_retrievable() {
        let manager = manager(None);
        manager
            .rebuild(docs(&[
                "Name: Priya Patel, Company: Microsoft",
                "Name: Rahul Kumar, Company: Amazon",
                "Name: Sneha Reddy, Company: Infosys",
            ]))
            .await
            .unwrap();

        manager
            .append("Name: Zubair Quraishi, Company: Zephyrlabs".to_string())
            .await
            .unwrap();

        let results = manager.retrieve("Zephyrlabs", 1).await.unwrap();
        assert_eq!(results[0].text, "Name: Zubair Quraishi, Company: Zephyrlabs");
        assert_eq!(manager.current().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_retriever_reports_staleness() {
        let manager = manager(None);
        manager.rebuild(docs(&["Name: Arjun Sharma"])).await.unwrap();

        let retriever = manager.retriever().unwrap();
        assert!(retriever.is_current());

        manager.append("Name: Kavya Nair".to_string()).await.unwrap();
        assert!(!retriever.is_current());
        // the old handle still reads its own snapshot
        assert_eq!(retriever.snapshot().len(), 1);
        assert!(manager.retriever().unwrap().is_current());
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("vectorstore_alumni"));

        let first = manager(Some(store.clone()));
        let update = first
            .rebuild(docs(&["Name: Arjun Sharma", "Name: Priya Patel"]))
            .await
            .unwrap();
        assert!(update.persisted);

        let second = manager(Some(store));
        assert!(second.load().await.unwrap());
        assert_eq!(second.current().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_from_other_model_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        manager(Some(store.clone()))
            .rebuild(docs(&["Name: Arjun Sharma"]))
            .await
            .unwrap();

        let other = IndexManager::new(Arc::new(HashingEmbedder::new(32)), Some(store), 8);
        assert!(!other.load().await.unwrap());
        assert_eq!(other.state(), IndexState::Absent);
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let manager = manager(None);
        let corpus = docs(&[
            "Name: Arjun Sharma, Company: Google",
            "Name: Priya Patel, Company: Microsoft",
            "Name: Rahul Kumar, Company: Amazon",
        ]);

        manager.rebuild(corpus.clone()).await.unwrap();
        let first = manager.retrieve("Who works at Google?", 2).await.unwrap();
        manager.rebuild(corpus).await.unwrap();
        let second = manager.retrieve("Who works at Google?", 2).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_persist_still_publishes() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("snapshots");
        std::fs::write(&blocked, b"occupied").unwrap();

        let manager = manager(Some(SnapshotStore::new(blocked.clone())));
        let update = manager.rebuild(docs(&["Name: Arjun Sharma"])).await.unwrap();
        assert!(!update.persisted);

        let update = manager
            .append("Name: Kavya Nair, Company: Zephyrlabs".to_string())
            .await
            .unwrap();
        assert!(!update.persisted);
        assert_eq!(update.entries, 2);
        let results = manager.retrieve("Zephyrlabs", 1).await.unwrap();
        assert_eq!(results[0].text, "Name: Kavya Nair, Company: Zephyrlabs");
    }
}
