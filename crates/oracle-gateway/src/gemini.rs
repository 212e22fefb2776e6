//! Google Generative Language (Gemini) client
//!
//! Implements both [`Embedder`] (`embedContent` / `batchEmbedContents`) and
//! [`Generator`] (`generateContent`) over the v1beta REST API. The key is
//! sent in the `x-goog-api-key` header. Requests are never retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{OracleError, OracleResult};
use crate::{http_client, validate_api_key, Embedder, Embedding, Generator, TaskType};

/// Public endpoint of the Generative Language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Embedding model used when none is configured
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
/// Generation model used when none is configured
pub const DEFAULT_GENERATION_MODEL: &str = "gemma-3-27b-it";

/// Upper bound on `requests` in one `batchEmbedContents` call
const MAX_BATCH: usize = 100;

/// Gemini configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key (`GOOGLE_API_KEY`)
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Embedding model name, with or without the `models/` prefix
    pub embedding_model: String,
    /// Generation model name, with or without the `models/` prefix
    pub generation_model: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            timeout: None,
        }
    }
}

impl GeminiConfig {
    /// Create config for a key with default models
    pub fn new(api_key: &str) -> Self {
        GeminiConfig {
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    /// Read `GOOGLE_API_KEY`, `TESTGEN_EMBEDDING_MODEL` and
    /// `TESTGEN_GENERATION_MODEL` from the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        GeminiConfig {
            api_key: std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
            embedding_model: std::env::var("TESTGEN_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            generation_model: std::env::var("TESTGEN_GENERATION_MODEL")
                .unwrap_or(defaults.generation_model),
            ..defaults
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    pub fn with_generation_model(mut self, model: &str) -> Self {
        self.generation_model = model.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// `models/<name>` regardless of how the name was configured
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Gemini client for embeddings and generation
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client, rejecting a missing or placeholder key
    pub fn new(config: GeminiConfig) -> OracleResult<Self> {
        validate_api_key("GOOGLE_API_KEY", &config.api_key)?;
        let http_client = http_client(config.timeout)?;
        Ok(GeminiClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> OracleResult<Self> {
        Self::new(GeminiConfig::from_env())
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.config.base_url, model_path(model), method)
    }

    /// POST a JSON body and return the response text of a 2xx reply.
    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        fail: fn(String) -> OracleError,
    ) -> OracleResult<String> {
        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", self.config.api_key.trim())
            .json(body)
            .send()
            .await
            .map_err(|e| fail(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| fail(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(fail(format!("HTTP {}: {}", status, truncate(&text, 512))));
        }
        Ok(text)
    }

    async fn embed_chunk(&self, texts: &[String]) -> OracleResult<Vec<Embedding>> {
        let model = model_path(&self.config.embedding_model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest::new(&model, text, TaskType::RetrievalDocument))
                .collect(),
        };
        let url = self.endpoint(&self.config.embedding_model, "batchEmbedContents");
        let body = self.post(&url, &request, OracleError::Embedding).await?;
        parse_batch_embeddings(&body, texts.len())
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    #[instrument(skip(self, texts), fields(model = %self.config.embedding_model, count = texts.len()))]
    async fn embed_documents(&self, texts: &[String]) -> OracleResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            vectors.extend(self.embed_chunk(chunk).await?);
        }
        debug!(
            dimension = vectors.first().map(Vec::len).unwrap_or(0),
            "Documents embedded"
        );
        Ok(vectors)
    }

    #[instrument(skip(self, text), fields(model = %self.config.embedding_model))]
    async fn embed_query(&self, text: &str) -> OracleResult<Embedding> {
        let model = model_path(&self.config.embedding_model);
        let request = EmbedContentRequest::new(&model, text, TaskType::RetrievalQuery);
        let url = self.endpoint(&self.config.embedding_model, "embedContent");
        let body = self.post(&url, &request, OracleError::Embedding).await?;
        parse_query_embedding(&body)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.generation_model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> OracleResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::from_text(prompt)],
        };
        let url = self.endpoint(&self.config.generation_model, "generateContent");
        let body = self.post(&url, &request, OracleError::Generation).await?;
        let text = parse_generated_text(&body)?;
        debug!(response_chars = text.len(), "Generation completed");
        Ok(text)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn from_text(text: &'a str) -> Self {
        Content {
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

impl<'a> EmbedContentRequest<'a> {
    fn new(model: &'a str, text: &'a str, task_type: TaskType) -> Self {
        EmbedContentRequest {
            model,
            content: Content::from_text(text),
            task_type: task_type.as_str(),
        }
    }
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Decode a `batchEmbedContents` reply, requiring one non-empty vector per input.
pub fn parse_batch_embeddings(body: &str, expected: usize) -> OracleResult<Vec<Embedding>> {
    let parsed: BatchEmbedResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::Embedding(format!("malformed embedding response: {}", e)))?;

    if parsed.embeddings.len() != expected {
        return Err(OracleError::Embedding(format!(
            "received {} embeddings for {} inputs",
            parsed.embeddings.len(),
            expected
        )));
    }
    for embedding in &parsed.embeddings {
        check_values(&embedding.values)?;
    }
    Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
}

/// Decode an `embedContent` reply.
pub fn parse_query_embedding(body: &str) -> OracleResult<Embedding> {
    let parsed: EmbedContentResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::Embedding(format!("malformed embedding response: {}", e)))?;

    check_values(&parsed.embedding.values)?;
    Ok(parsed.embedding.values)
}

/// Out-of-range numbers decode to `inf`; neither they nor empty vectors are usable.
fn check_values(values: &[f32]) -> OracleResult<()> {
    if values.is_empty() {
        return Err(OracleError::Embedding(
            "response contained an empty embedding".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(OracleError::Embedding(
            "response contained a non-finite embedding value".to_string(),
        ));
    }
    Ok(())
}

/// Concatenate the text parts of the first candidate of a `generateContent` reply.
pub fn parse_generated_text(body: &str) -> OracleResult<String> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::Generation(format!("malformed generation response: {}", e)))?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| OracleError::Generation("response has no candidates".to_string()))?;

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GeminiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.embedding_model, "text-embedding-004");
        assert_eq!(config.generation_model, "gemma-3-27b-it");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = GeminiConfig::new("key")
            .with_base_url("http://localhost:9000/v1beta/")
            .with_embedding_model("models/embedding-001")
            .with_timeout(Duration::from_secs(30));
        assert_eq!(config.base_url, "http://localhost:9000/v1beta");
        assert_eq!(config.embedding_model, "models/embedding-001");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_model_path_prefixes_once() {
        assert_eq!(model_path("text-embedding-004"), "models/text-embedding-004");
        assert_eq!(model_path("models/text-embedding-004"), "models/text-embedding-004");
    }

    #[test]
    fn test_client_rejects_placeholder_key() {
        let err = GeminiClient::new(GeminiConfig::new("YOUR_GOOGLE_API_KEY")).err().unwrap();
        assert!(matches!(err, OracleError::Configuration(_)));
    }

    #[test]
    fn test_endpoint_layout() {
        let client = GeminiClient::new(GeminiConfig::new("key")).unwrap();
        assert_eq!(
            client.endpoint("text-embedding-004", "embedContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn test_embed_request_wire_shape() {
        let request = EmbedContentRequest::new(
            "models/text-embedding-004",
            "Login flow",
            TaskType::RetrievalQuery,
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "models/text-embedding-004",
                "content": {"parts": [{"text": "Login flow"}]},
                "taskType": "RETRIEVAL_QUERY"
            })
        );
    }

    #[tokio::test]
    async fn test_empty_document_batch_makes_no_request() {
        // Unroutable base URL: any request would fail.
        let client =
            GeminiClient::new(GeminiConfig::new("key").with_base_url("http://127.0.0.1:1")).unwrap();
        let vectors = client.embed_documents(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[test]
    fn test_parse_batch_embeddings() {
        let body = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let vectors = parse_batch_embeddings(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn test_parse_batch_embeddings_count_mismatch() {
        let body = r#"{"embeddings": [{"values": [0.1, 0.2]}]}"#;
        let err = parse_batch_embeddings(body, 2).unwrap_err();
        assert!(matches!(err, OracleError::Embedding(ref msg) if msg.contains("1 embeddings for 2")));
    }

    #[test]
    fn test_parse_query_embedding_malformed() {
        let err = parse_query_embedding("<html>quota</html>").unwrap_err();
        assert!(matches!(err, OracleError::Embedding(_)));

        let err = parse_query_embedding(r#"{"embedding": {"values": []}}"#).unwrap_err();
        assert!(matches!(err, OracleError::Embedding(_)));
    }

    #[test]
    fn test_parse_embeddings_reject_out_of_range_values() {
        let body = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [1e39, 0.4]}]}"#;
        let err = parse_batch_embeddings(body, 2).unwrap_err();
        assert!(matches!(err, OracleError::Embedding(ref msg) if msg.contains("non-finite")));

        let err = parse_query_embedding(r#"{"embedding": {"values": [-1e39]}}"#).unwrap_err();
        assert!(matches!(err, OracleError::Embedding(_)));
    }

    #[test]
    fn test_parse_generated_text_joins_parts() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "```json\n["}, {"text": "]\n```"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        assert_eq!(parse_generated_text(body).unwrap(), "```json\n[]\n```");
    }

    #[test]
    fn test_parse_generated_text_without_candidates() {
        let err = parse_generated_text(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, OracleError::Generation(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("登录页面", 2), "登录");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
