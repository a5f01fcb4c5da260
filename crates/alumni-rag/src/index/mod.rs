//! Vector index over projected alumni records
//!
//! A [`VectorIndex`] is an immutable snapshot: every mutation produces a new
//! value which the [`IndexManager`] publishes by swapping an `Arc`.

pub mod manager;
pub mod snapshot;

pub use manager::{IndexManager, IndexState, IndexUpdate, Retriever};
pub use snapshot::SnapshotStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simsimd::SpatialSimilarity;

/// Text stored when an index is built from an empty collection
pub const PLACEHOLDER_TEXT: &str = "No alumni data available.";

/// Default number of documents returned by a retrieval
pub const DEFAULT_TOP_K: usize = 5;

/// One indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A retrieved document with its cosine similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub text: String,
    pub score: f32,
}

/// Immutable snapshot of `(text, embedding)` entries in insertion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    /// Embedding model the entries were produced with
    model: String,
    dimensions: usize,
    /// Holds only [`PLACEHOLDER_TEXT`]
    #[serde(default)]
    is_placeholder: bool,
    created_at: DateTime<Utc>,
}

impl VectorIndex {
    pub fn new(model: impl Into<String>, dimensions: usize, entries: Vec<IndexEntry>) -> Self {
        Self {
            entries,
            model: model.into(),
            dimensions,
            is_placeholder: false,
            created_at: Utc::now(),
        }
    }

    /// Index holding only the placeholder document
    pub fn placeholder(model: impl Into<String>, dimensions: usize, embedding: Vec<f32>) -> Self {
        Self {
            is_placeholder: true,
            ..Self::new(
                model,
                dimensions,
                vec![IndexEntry {
                    text: PLACEHOLDER_TEXT.to_string(),
                    embedding,
                }],
            )
        }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Copy of this index with one more entry; a placeholder entry is dropped
    pub fn with_entry(&self, entry: IndexEntry) -> Self {
        let mut entries = if self.is_placeholder {
            Vec::with_capacity(1)
        } else {
            let mut entries = Vec::with_capacity(self.entries.len() + 1);
            entries.extend(self.entries.iter().cloned());
            entries
        };
        entries.push(entry);
        Self::new(self.model.clone(), self.dimensions, entries)
    }

    /// Exact cosine scan (simsimd kernels), best first.
    ///
    /// Equal scores keep insertion order. `k` is clamped to the number of entries.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredDocument> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k.min(self.entries.len()))
            .map(|(i, score)| ScoredDocument {
                text: self.entries[i].text.clone(),
                score,
            })
            .collect()
    }
}

/// Cosine similarity; zero vectors and length mismatches score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    // simsimd scores two zero vectors as identical
    match (f32::dot(a, a), f32::dot(b, b)) {
        (Some(norm_a), Some(norm_b)) if norm_a > 0.0 && norm_b > 0.0 => {}
        _ => return 0.0,
    }

    match f32::cosine(a, b) {
        Some(distance) if distance.is_finite() => (1.0 - distance) as f32,
        _ => 0.0,
    }
}
