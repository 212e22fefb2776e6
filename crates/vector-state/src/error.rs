//! Error types for vector-state

use thiserror::Error;

/// Errors that can occur in the index persistence layer.
///
/// Every variant is fatal for the operation that produced it; the index
/// never attempts to repair its own store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Could not open or attach to the backing store
    #[error("index store connection failed: {0}")]
    Connection(String),

    /// Schema definition failed
    #[error("index schema setup failed: {0}")]
    SchemaSetup(String),

    /// A query or write against the backing store failed
    #[error("index backend error: {0}")]
    Backend(String),

    /// An id being added already exists (or is repeated within the batch)
    #[error("duplicate id {id} in collection {collection}")]
    DuplicateId { collection: String, id: String },

    /// A vector does not match the collection's dimensionality
    #[error("dimension mismatch in collection {collection}: expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// An entry is structurally invalid (e.g. empty id or vector)
    #[error("invalid index entry: {0}")]
    InvalidEntry(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(format!("serialization failed: {err}"))
    }
}
