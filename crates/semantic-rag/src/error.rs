//! Error types for semantic-rag

use oracle_gateway::OracleError;
use thiserror::Error;
use vector_state::StorageError;

/// Errors that abort an index build
#[derive(Error, Debug)]
pub enum RagError {
    /// Embedding service failure
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Vector index failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Embedder returned a different number of vectors than texts sent
    #[error("Embedder returned {actual} vectors for {expected} documents")]
    EmbeddingCountMismatch { expected: usize, actual: usize },
}

/// Result type for retrieval operations
pub type RagResult<T> = std::result::Result<T, RagError>;
