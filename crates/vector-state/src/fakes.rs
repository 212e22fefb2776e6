//! In-memory fake for the index trait (testing only)
//!
//! Provides `MemoryVectorIndex`, which satisfies the `VectorIndex` contract
//! without any external dependencies.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage_traits::*;

#[derive(Debug, Default)]
struct CollectionState {
    entries: Vec<IndexEntry>,
    dimension: Option<usize>,
}

/// In-memory index backed by an insertion-ordered `Vec<IndexEntry>`.
#[derive(Debug)]
pub struct MemoryVectorIndex {
    collection: String,
    state: Mutex<CollectionState>,
}

impl MemoryVectorIndex {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            state: Mutex::new(CollectionState::default()),
        }
    }

    /// Snapshot of stored entries in insertion order.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.state.lock().unwrap().entries.clone()
    }
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::new(crate::DEFAULT_COLLECTION)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn add(&self, entries: Vec<IndexEntry>) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        let dimension = validate_batch(&self.collection, &entries, state.dimension)?;

        if let Some(dup) = entries
            .iter()
            .find(|new| state.entries.iter().any(|old| old.id == new.id))
        {
            return Err(StorageError::DuplicateId {
                collection: self.collection.clone(),
                id: dup.id.clone(),
            });
        }

        state.dimension = dimension;
        state.entries.extend(entries);
        Ok(())
    }

    async fn query_scored(&self, vector: &[f32], k: usize) -> StorageResult<Vec<QueryMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let state = self.state.lock().unwrap();
        check_query_dimension(&self.collection, vector, state.dimension)?;
        Ok(rank_by_similarity(vector, &state.entries, k))
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.state.lock().unwrap().entries.len())
    }

    async fn contains(&self, id: &str) -> StorageResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.entries.iter().any(|entry| entry.id == id))
    }

    async fn dimension(&self) -> StorageResult<Option<usize>> {
        Ok(self.state.lock().unwrap().dimension)
    }

    async fn clear(&self) -> StorageResult<usize> {
        let mut state = self.state.lock().unwrap();
        let removed = state.entries.len();
        *state = CollectionState::default();
        Ok(removed)
    }
}
