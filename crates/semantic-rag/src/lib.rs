//! Semantic-RAG: knowledge retrieval for test-case generation
//!
//! Loads a directory of markdown notes into a persistent vector index and
//! answers similarity queries against it.
//!
//! ## Layer 3 - Retrieval
//!
//! - [`corpus`]: discover and read the knowledge documents
//! - [`service`]: build the index and query it

pub mod corpus;
pub mod error;
pub mod service;

pub use corpus::{load_corpus, Corpus, CorpusReadError, KnowledgeDocument};
pub use error::{RagError, RagResult};
pub use service::{BuildReport, IndexStats, RagService, DEFAULT_N_RESULTS};
