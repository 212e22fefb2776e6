//! Runtime settings for a testgen invocation
//!
//! The CLI fills these from flags and environment variables (`.env` files
//! included); library users can build them directly.

use std::path::PathBuf;
use std::time::Duration;

use oracle_gateway::{validate_api_key, FigmaConfig, GeminiConfig};
use semantic_rag::DEFAULT_N_RESULTS;
use thiserror::Error;
use vector_state::{StorageLocation, DEFAULT_COLLECTION};

use crate::prompt::PromptOptions;

pub const DEFAULT_KNOWLEDGE_DIR: &str = "knowledge_base";
pub const DEFAULT_INDEX_DIR: &str = ".testgen/index";
pub const DEFAULT_OUTPUT_DIR: &str = "testcases";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Missing or placeholder API key
    #[error("{0}")]
    Credential(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct Settings {
    pub figma_api_key: String,
    pub google_api_key: String,
    pub knowledge_dir: PathBuf,
    pub index_dir: PathBuf,
    pub collection: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub output_dir: PathBuf,
    pub n_results: usize,
    pub http_timeout: Option<Duration>,
    pub prompt: PromptOptions,
}

impl Default for Settings {
    fn default() -> Self {
        let gemini = GeminiConfig::default();
        Settings {
            figma_api_key: String::new(),
            google_api_key: String::new(),
            knowledge_dir: PathBuf::from(DEFAULT_KNOWLEDGE_DIR),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            collection: DEFAULT_COLLECTION.to_string(),
            embedding_model: gemini.embedding_model,
            generation_model: gemini.generation_model,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            n_results: DEFAULT_N_RESULTS,
            http_timeout: None,
            prompt: PromptOptions::default(),
        }
    }
}

impl Settings {
    /// Check values that do not depend on which command runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "collection".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.prompt.target_cases == 0 {
            return Err(ConfigError::InvalidValue {
                name: "target_cases".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.http_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue {
                name: "TESTGEN_HTTP_TIMEOUT_SECS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn require_figma_key(&self) -> Result<(), ConfigError> {
        validate_api_key("FIGMA_API_KEY", &self.figma_api_key)
            .map_err(|e| ConfigError::Credential(e.to_string()))
    }

    pub fn require_google_key(&self) -> Result<(), ConfigError> {
        validate_api_key("GOOGLE_API_KEY", &self.google_api_key)
            .map_err(|e| ConfigError::Credential(e.to_string()))
    }

    pub fn storage_location(&self) -> StorageLocation {
        StorageLocation::Path(self.index_dir.clone())
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        let config = GeminiConfig::new(&self.google_api_key)
            .with_embedding_model(&self.embedding_model)
            .with_generation_model(&self.generation_model);
        match self.http_timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }

    pub fn figma_config(&self) -> FigmaConfig {
        let config = FigmaConfig::new(&self.figma_api_key);
        match self.http_timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}
