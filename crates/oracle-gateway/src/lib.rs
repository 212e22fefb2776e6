//! Oracle-Gateway: external model and design-tool access for testgen
//!
//! This crate wraps every remote service the generator talks to behind a
//! small capability trait, so that the layers above can be exercised with
//! deterministic fakes.
//!
//! ## Layer 2 - Oracles
//!
//! - [`Embedder`]: text to fixed-length vectors (document and query modes)
//! - [`Generator`]: prompt to raw model text
//! - [`figma::FigmaClient`]: design file JSON by URL

pub mod error;
pub mod fakes;
pub mod figma;
pub mod gemini;

use async_trait::async_trait;

pub use error::{OracleError, OracleResult};
pub use figma::{file_key_from_url, FigmaClient, FigmaConfig};
pub use gemini::{GeminiClient, GeminiConfig};

/// Dense vector produced by an [`Embedder`]
pub type Embedding = Vec<f32>;

/// Placeholder values shipped in sample configuration
pub const PLACEHOLDER_KEYS: [&str; 2] = ["YOUR_FIGMA_API_KEY", "YOUR_GOOGLE_API_KEY"];

/// Which side of retrieval an embedding is for.
///
/// Providers may embed the same text differently depending on the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

impl TaskType {
    /// Wire form used by the Gemini API
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            TaskType::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text embedding capability.
///
/// All vectors returned by one embedder share the same dimensionality.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed documents for storage. Output order matches input order;
    /// an empty input yields an empty output.
    async fn embed_documents(&self, texts: &[String]) -> OracleResult<Vec<Embedding>>;

    /// Embed a single retrieval query.
    async fn embed_query(&self, text: &str) -> OracleResult<Embedding>;
}

/// Text generation capability.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send one prompt and return the model's raw text.
    async fn generate(&self, prompt: &str) -> OracleResult<String>;
}

/// Reject an empty or placeholder credential before any network call.
pub fn validate_api_key(name: &str, value: &str) -> OracleResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OracleError::Configuration(format!("{} is not set", name)));
    }
    if PLACEHOLDER_KEYS.contains(&trimmed) {
        return Err(OracleError::Configuration(format!(
            "{} still holds the placeholder value {}",
            name, trimmed
        )));
    }
    Ok(())
}

/// Shared HTTP client builder for the oracle clients.
pub(crate) fn http_client(timeout: Option<std::time::Duration>) -> OracleResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        "testgen-oracle-gateway/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| OracleError::Configuration(format!("Failed to create HTTP client: {}", e)))
}
