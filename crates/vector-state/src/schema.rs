//! Row definitions for the index tables
//!
//! Tables:
//! - index_entries: Embedded documents, one row per (collection, doc_id)
//! - collections: Per-collection bookkeeping (fixed dimensionality)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::IndexEntry;

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Stored index entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EntryRecord {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Owning collection
    pub collection: String,
    /// Caller-assigned document id (unique per collection)
    pub doc_id: String,
    /// Insertion sequence, used to order ties
    pub seq: u64,
    /// Document text
    pub document: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// Metadata
    pub metadata: serde_json::Value,
    /// Created timestamp
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl EntryRecord {
    /// Build a row for `entry` at insertion position `seq`
    pub fn new(collection: &str, seq: u64, entry: IndexEntry) -> Self {
        EntryRecord {
            id: None,
            collection: collection.to_string(),
            doc_id: entry.id,
            seq,
            document: entry.document,
            embedding: entry.vector,
            metadata: entry.metadata,
            created_at: Utc::now(),
        }
    }

    /// Convert back into the backend-agnostic entry
    pub fn into_entry(self) -> IndexEntry {
        IndexEntry {
            id: self.doc_id,
            vector: self.embedding,
            document: self.document,
            metadata: self.metadata,
        }
    }
}

/// Collection bookkeeping row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CollectionRecord {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Collection name
    pub name: String,
    /// Dimensionality fixed by the first stored vector
    pub dimension: u64,
    /// Created timestamp
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CollectionRecord {
    pub fn new(name: &str, dimension: usize) -> Self {
        CollectionRecord {
            id: None,
            name: name.to_string(),
            dimension: dimension as u64,
            created_at: Utc::now(),
        }
    }
}

/// Projection used by `count()`
#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub total: u64,
}

/// Projection used by id lookups
#[derive(Debug, Deserialize)]
pub(crate) struct DocIdRow {
    pub doc_id: String,
}

/// Projection used by dimension lookups
#[derive(Debug, Deserialize)]
pub(crate) struct DimensionRow {
    pub dimension: u64,
}
