//! SurrealDB index handle - connection and operations
//!
//! Provides `SurrealVectorIndex`, the durable `VectorIndex` backend.
//! Supports the in-memory engine (tests), the embedded on-disk engine
//! (`surrealkv://`, the default for the CLI), and any remote URL.

use std::path::PathBuf;

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::StorageError;
use crate::migrations;
use crate::schema::{CollectionRecord, CountRow, DimensionRow, DocIdRow, EntryRecord};
use crate::storage_traits::{
    check_query_dimension, rank_by_similarity, validate_batch, IndexEntry, QueryMatch,
    StorageResult, VectorIndex,
};

const NAMESPACE: &str = "testgen";
const DATABASE: &str = "knowledge";

/// Where the index lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// Process-local, discarded on exit
    Memory,
    /// Embedded on-disk store in this directory (created if missing)
    Path(PathBuf),
    /// Any SurrealDB endpoint URL (e.g. `ws://localhost:8000`)
    Url(String),
}

impl StorageLocation {
    /// Resolve to a SurrealDB endpoint, creating the directory for `Path`.
    fn endpoint(&self) -> StorageResult<String> {
        match self {
            StorageLocation::Memory => Ok("mem://".to_string()),
            StorageLocation::Path(path) => {
                std::fs::create_dir_all(path).map_err(|e| {
                    StorageError::Connection(format!(
                        "Failed to create index directory {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(format!("surrealkv://{}", path.display()))
            }
            StorageLocation::Url(url) => Ok(url.clone()),
        }
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageLocation::Memory => write!(f, "mem://"),
            StorageLocation::Path(path) => write!(f, "{}", path.display()),
            StorageLocation::Url(url) => write!(f, "{}", url),
        }
    }
}

/// SurrealDB-backed implementation of [`VectorIndex`] for one collection.
#[derive(Clone)]
pub struct SurrealVectorIndex {
    db: Surreal<Any>,
    collection: String,
}

impl SurrealVectorIndex {
    /// Attach to the store at `location`, creating it if it does not exist.
    ///
    /// Idempotent and non-destructive: existing entries are preserved.
    #[instrument(skip_all, fields(location = %location, collection = %collection))]
    pub async fn open_or_create(location: &StorageLocation, collection: &str) -> StorageResult<Self> {
        if collection.trim().is_empty() {
            return Err(StorageError::InvalidEntry(
                "collection name is required".to_string(),
            ));
        }

        let url = location.endpoint()?;
        let db = surrealdb::engine::any::connect(&url)
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        let index = SurrealVectorIndex {
            db,
            collection: collection.to_string(),
        };
        info!(entries = index.count().await?, "Index collection ready");
        Ok(index)
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory(collection: &str) -> StorageResult<Self> {
        Self::open_or_create(&StorageLocation::Memory, collection).await
    }

    /// A handle on another collection of the same store.
    pub fn with_collection(&self, collection: &str) -> Self {
        SurrealVectorIndex {
            db: self.db.clone(),
            collection: collection.to_string(),
        }
    }

    /// All rows of this collection in insertion order.
    async fn load_entries(&self) -> StorageResult<Vec<IndexEntry>> {
        let mut result = self
            .db
            .query("SELECT * FROM index_entries WHERE collection = $collection ORDER BY seq ASC")
            .bind(("collection", self.collection.clone()))
            .await?;

        let rows: Vec<EntryRecord> = result.take(0)?;
        Ok(rows.into_iter().map(EntryRecord::into_entry).collect())
    }

    /// Ids from `ids` that are already stored.
    async fn existing_ids(&self, ids: Vec<String>) -> StorageResult<Vec<String>> {
        let mut result = self
            .db
            .query("SELECT doc_id FROM index_entries WHERE collection = $collection AND doc_id IN $ids")
            .bind(("collection", self.collection.clone()))
            .bind(("ids", ids))
            .await?;

        let rows: Vec<DocIdRow> = result.take(0)?;
        Ok(rows.into_iter().map(|row| row.doc_id).collect())
    }
}

#[async_trait]
impl VectorIndex for SurrealVectorIndex {
    fn collection(&self) -> &str {
        &self.collection
    }

    #[instrument(skip(self, entries), fields(collection = %self.collection, batch = entries.len()))]
    async fn add(&self, entries: Vec<IndexEntry>) -> StorageResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let stored_dimension = self.dimension().await?;
        let batch_dimension = validate_batch(&self.collection, &entries, stored_dimension)?;

        let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        if let Some(id) = self.existing_ids(ids).await?.into_iter().next() {
            return Err(StorageError::DuplicateId {
                collection: self.collection.clone(),
                id,
            });
        }

        let start = self.count().await? as u64;
        let rows: Vec<EntryRecord> = entries
            .into_iter()
            .enumerate()
            .map(|(offset, entry)| EntryRecord::new(&self.collection, start + offset as u64, entry))
            .collect();

        // Dimension row and entries commit together.
        let new_collection = match (stored_dimension, batch_dimension) {
            (None, Some(dimension)) => Some(CollectionRecord::new(&self.collection, dimension)),
            _ => None,
        };
        let mut sql = String::from("BEGIN TRANSACTION;\n");
        if new_collection.is_some() {
            sql.push_str("CREATE collections CONTENT $collection_row;\n");
        }
        sql.push_str("INSERT INTO index_entries $rows;\nCOMMIT TRANSACTION;");

        let mut query = self.db.query(sql).bind(("rows", rows));
        if let Some(row) = new_collection {
            debug!(dimension = row.dimension, "Recording collection dimension");
            query = query.bind(("collection_row", row));
        }
        query.await.and_then(|response| response.check())?;

        debug!("Batch stored");
        Ok(())
    }

    #[instrument(skip(self, vector), fields(collection = %self.collection))]
    async fn query_scored(&self, vector: &[f32], k: usize) -> StorageResult<Vec<QueryMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        check_query_dimension(&self.collection, vector, self.dimension().await?)?;

        let entries = self.load_entries().await?;
        let hits = rank_by_similarity(vector, &entries, k);
        debug!(candidates = entries.len(), returned = hits.len(), "Query ranked");
        Ok(hits)
    }

    async fn count(&self) -> StorageResult<usize> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM index_entries WHERE collection = $collection GROUP ALL")
            .bind(("collection", self.collection.clone()))
            .await?;

        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|row| row.total as usize).unwrap_or(0))
    }

    async fn contains(&self, id: &str) -> StorageResult<bool> {
        Ok(!self.existing_ids(vec![id.to_string()]).await?.is_empty())
    }

    async fn dimension(&self) -> StorageResult<Option<usize>> {
        let mut result = self
            .db
            .query("SELECT dimension FROM collections WHERE name = $name")
            .bind(("name", self.collection.clone()))
            .await?;

        let rows: Vec<DimensionRow> = result.take(0)?;
        Ok(rows.first().map(|row| row.dimension as usize))
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn clear(&self) -> StorageResult<usize> {
        let removed = self.count().await?;

        self.db
            .query("DELETE index_entries WHERE collection = $collection")
            .query("DELETE collections WHERE name = $collection")
            .bind(("collection", self.collection.clone()))
            .await
            .and_then(|response| response.check())?;

        info!(removed, "Collection cleared");
        Ok(removed)
    }
}
