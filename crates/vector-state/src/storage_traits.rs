//! Storage trait definitions for the knowledge index
//!
//! `VectorIndex` defines the index abstraction used by retrieval:
//! - `add`: append embedded documents (ids unique per collection)
//! - `query`: k-nearest documents by cosine similarity
//! - `count`: number of stored entries
//!
//! All methods are async and backend-agnostic. An in-memory fake is
//! provided for testing via the `fakes` module.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One stored document: id, embedding vector, text, and free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique id within the collection
    pub id: String,
    /// Embedding vector (dimension fixed per collection)
    pub vector: Vec<f32>,
    /// Document text returned by queries
    pub document: String,
    /// Arbitrary metadata (e.g. `{"source": "kb/login.md"}`)
    pub metadata: serde_json::Value,
}

impl IndexEntry {
    /// Create an entry with empty metadata
    pub fn new(id: impl Into<String>, vector: Vec<f32>, document: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vector,
            document: document.into(),
            metadata: serde_json::json!({}),
        }
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A ranked query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Entry id
    pub id: String,
    /// Document text
    pub document: String,
    /// Cosine similarity to the query vector (higher is closer)
    pub score: f32,
}

// ---------------------------------------------------------------------------
// VectorIndex
// ---------------------------------------------------------------------------

/// Persistent vector index over a single named collection.
///
/// Guarantees:
/// - Ids are unique within the collection; `add` rejects a batch containing
///   an existing or repeated id without writing any of it.
/// - Every stored vector has the collection's dimensionality, which is fixed
///   by the first vector ever stored.
/// - `query` returns at most `k` documents, most similar first, and an empty
///   result for an empty collection.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the collection this handle is attached to.
    fn collection(&self) -> &str;

    /// Append entries to the collection.
    async fn add(&self, entries: Vec<IndexEntry>) -> StorageResult<()>;

    /// The `k` nearest entries to `vector`, with their similarity scores.
    async fn query_scored(&self, vector: &[f32], k: usize) -> StorageResult<Vec<QueryMatch>>;

    /// The `k` nearest documents to `vector`, most similar first.
    async fn query(&self, vector: &[f32], k: usize) -> StorageResult<Vec<String>> {
        Ok(self
            .query_scored(vector, k)
            .await?
            .into_iter()
            .map(|hit| hit.document)
            .collect())
    }

    /// Number of entries currently stored.
    async fn count(&self) -> StorageResult<usize>;

    /// Whether an entry with this id exists.
    async fn contains(&self, id: &str) -> StorageResult<bool>;

    /// Dimensionality of the collection, once the first vector is stored.
    async fn dimension(&self) -> StorageResult<Option<usize>>;

    /// Remove every entry (and the recorded dimension). Returns the number removed.
    async fn clear(&self) -> StorageResult<usize>;
}

// ---------------------------------------------------------------------------
// Similarity helpers shared by all backends
// ---------------------------------------------------------------------------

/// Cosine similarity of two equal-length vectors. Zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Rank `entries` against `query`, keeping the top `k`.
///
/// Ties keep the order of `entries` (insertion order for both backends).
pub fn rank_by_similarity(query: &[f32], entries: &[IndexEntry], k: usize) -> Vec<QueryMatch> {
    let mut hits: Vec<QueryMatch> = entries
        .iter()
        .map(|entry| QueryMatch {
            id: entry.id.clone(),
            document: entry.document.clone(),
            score: cosine_similarity(query, &entry.vector),
        })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(k);
    hits
}

/// Validate a batch before any of it is written.
///
/// Checks non-empty ids, finite non-empty vectors, object metadata and
/// uniqueness within the batch. Every vector must match `dimension` (or the
/// first vector, when the collection has none yet). Returns the batch
/// dimension.
pub(crate) fn validate_batch(
    collection: &str,
    entries: &[IndexEntry],
    dimension: Option<usize>,
) -> StorageResult<Option<usize>> {
    let mut seen = HashSet::new();
    let mut expected = dimension;

    for entry in entries {
        if entry.id.trim().is_empty() {
            return Err(StorageError::InvalidEntry("entry id is empty".to_string()));
        }
        if entry.vector.is_empty() {
            return Err(StorageError::InvalidEntry(format!(
                "entry {} has an empty vector",
                entry.id
            )));
        }
        if entry.vector.iter().any(|x| !x.is_finite()) {
            return Err(StorageError::InvalidEntry(format!(
                "entry {} has a non-finite vector component",
                entry.id
            )));
        }
        if !entry.metadata.is_object() {
            return Err(StorageError::InvalidEntry(format!(
                "entry {} metadata must be an object",
                entry.id
            )));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(StorageError::DuplicateId {
                collection: collection.to_string(),
                id: entry.id.clone(),
            });
        }
        match expected {
            Some(dim) if dim != entry.vector.len() => {
                return Err(StorageError::DimensionMismatch {
                    collection: collection.to_string(),
                    expected: dim,
                    actual: entry.vector.len(),
                });
            }
            Some(_) => {}
            None => expected = Some(entry.vector.len()),
        }
    }

    Ok(expected)
}

/// Reject a query vector with non-finite components or whose length
/// differs from the collection's.
pub(crate) fn check_query_dimension(
    collection: &str,
    vector: &[f32],
    dimension: Option<usize>,
) -> StorageResult<()> {
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(StorageError::InvalidEntry(
            "query vector has a non-finite component".to_string(),
        ));
    }
    match dimension {
        Some(dim) if dim != vector.len() => Err(StorageError::DimensionMismatch {
            collection: collection.to_string(),
            expected: dim,
            actual: vector.len(),
        }),
        _ => Ok(()),
    }
}
