//! Figma REST client
//!
//! Fetches the full JSON document of a design file given its browser URL.

use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, instrument};

use crate::error::{OracleError, OracleResult};
use crate::{http_client, validate_api_key};

/// Public Figma API root
pub const DEFAULT_BASE_URL: &str = "https://api.figma.com";

const FILE_URL_PATTERN: &str = r"figma\.com/(?:design|proto|file)/([^/?#]+)";

/// Extract the file key from a Figma URL.
///
/// Accepts `figma.com/design/<key>/...`, `figma.com/proto/<key>/...` and the
/// legacy `figma.com/file/<key>/...` forms.
pub fn file_key_from_url(url: &str) -> OracleResult<String> {
    let re = Regex::new(FILE_URL_PATTERN)
        .map_err(|e| OracleError::InvalidDesignUrl(format!("{}: {}", url, e)))?;

    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|key| key.as_str().to_string())
        .ok_or_else(|| OracleError::InvalidDesignUrl(url.to_string()))
}

/// Figma configuration
#[derive(Debug, Clone)]
pub struct FigmaConfig {
    /// Personal access token (`FIGMA_API_KEY`)
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for FigmaConfig {
    fn default() -> Self {
        FigmaConfig {
            api_key: std::env::var("FIGMA_API_KEY").unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl FigmaConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific token
    pub fn new(api_key: &str) -> Self {
        FigmaConfig {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Figma client for design file retrieval
pub struct FigmaClient {
    config: FigmaConfig,
    http_client: reqwest::Client,
}

impl FigmaClient {
    /// Create a new Figma client, rejecting a missing or placeholder token
    pub fn new(config: FigmaConfig) -> OracleResult<Self> {
        validate_api_key("FIGMA_API_KEY", &config.api_key)?;
        let http_client = http_client(config.timeout)?;
        Ok(FigmaClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> OracleResult<Self> {
        Self::new(FigmaConfig::from_env())
    }

    fn file_endpoint(&self, key: &str) -> String {
        format!("{}/v1/files/{}", self.config.base_url, key)
    }

    /// Fetch the design file behind `url` as raw JSON.
    #[instrument(skip(self))]
    pub async fn fetch_file(&self, url: &str) -> OracleResult<serde_json::Value> {
        let key = file_key_from_url(url)?;
        self.fetch_file_by_key(&key).await
    }

    /// Fetch a design file by key as raw JSON.
    #[instrument(skip(self))]
    pub async fn fetch_file_by_key(&self, key: &str) -> OracleResult<serde_json::Value> {
        let endpoint = self.file_endpoint(key);
        debug!(%endpoint, "Fetching design file");

        let response = self
            .http_client
            .get(&endpoint)
            .header("X-Figma-Token", self.config.api_key.trim())
            .send()
            .await
            .map_err(|e| OracleError::Design(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Design(format!("HTTP {} for file {}: {}", status, key, body)));
        }

        let file: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::Design(format!("malformed design JSON: {}", e)))?;

        info!(
            file = file.get("name").and_then(|n| n.as_str()).unwrap_or("<unnamed>"),
            "Design file fetched"
        );
        Ok(file)
    }
}
