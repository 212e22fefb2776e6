//! Error types for oracle-gateway

use thiserror::Error;

/// Errors raised by the external oracles (Gemini, Figma)
#[derive(Error, Debug)]
pub enum OracleError {
    /// Missing or placeholder credential, invalid client settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Embedding request failed or returned an unusable payload
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Generation request failed at the transport or payload level
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Design file could not be fetched or decoded
    #[error("Design fetch failed: {0}")]
    Design(String),

    /// URL does not point at a Figma file
    #[error("Not a Figma file URL: {0}")]
    InvalidDesignUrl(String),
}

/// Result type for oracle operations
pub type OracleResult<T> = std::result::Result<T, OracleError>;
