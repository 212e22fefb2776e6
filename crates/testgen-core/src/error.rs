//! Top-level error type for testgen-core

use oracle_gateway::OracleError;
use semantic_rag::RagError;
use thiserror::Error;
use vector_state::StorageError;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::generation::GenerationError;

#[derive(Error, Debug)]
pub enum TestgenError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("design file is not valid Figma JSON: {0}")]
    Design(#[from] serde_json::Error),

    #[error("knowledge index error: {0}")]
    Rag(#[from] RagError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Result type for testgen-core operations.
pub type Result<T> = std::result::Result<T, TestgenError>;
