//! Vector-State: SurrealDB Backend for the testgen knowledge index
//!
//! This crate provides the persistence layer for retrieval. It stores
//! embedded knowledge documents in a named collection and answers
//! nearest-neighbour queries over them.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: Durability across runs, id uniqueness, and dimensional consistency.
//!
//! ## Key Components
//!
//! - `VectorIndex`: Backend-agnostic index contract (add/query/count)
//! - `SurrealVectorIndex`: Embedded SurrealDB implementation (`mem://` or `surrealkv://`)
//! - `MemoryVectorIndex`: In-memory fake for tests

mod error;
pub mod fakes;
mod handle;
mod migrations;
mod schema;
pub mod storage_traits;

pub use error::StorageError;
pub use handle::{StorageLocation, SurrealVectorIndex};
pub use storage_traits::{
    cosine_similarity, rank_by_similarity, IndexEntry, QueryMatch, StorageResult, VectorIndex,
};

/// Collection name used when the caller does not supply one.
pub const DEFAULT_COLLECTION: &str = "figma_test_cases";
