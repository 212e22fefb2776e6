//! Deterministic oracle stand-ins (testing and offline use)
//!
//! Provides `KeywordEmbedder`, `FailingEmbedder` and `ScriptedGenerator`,
//! which satisfy the `Embedder`/`Generator` contracts without any network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{OracleError, OracleResult};
use crate::{Embedder, Embedding, Generator};

/// Bag-of-keywords embedder.
///
/// Component `i` of a vector is the number of case-insensitive occurrences
/// of `vocabulary[i]` in the text, so texts sharing keywords land close
/// together under cosine similarity.
#[derive(Debug)]
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    document_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new<S: AsRef<str>>(vocabulary: &[S]) -> Self {
        KeywordEmbedder {
            vocabulary: vocabulary
                .iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
            document_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of `embed_documents` calls that reached the embedder with work to do.
    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let lowered = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|word| lowered.matches(word.as_str()).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> OracleResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }

    async fn embed_query(&self, text: &str) -> OracleResult<Embedding> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }
}

/// Embedder whose every call fails, simulating an unreachable service.
#[derive(Debug, Default)]
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_documents(&self, _texts: &[String]) -> OracleResult<Vec<Embedding>> {
        Err(OracleError::Embedding("embedding service unavailable".to_string()))
    }

    async fn embed_query(&self, _text: &str) -> OracleResult<Embedding> {
        Err(OracleError::Embedding("embedding service unavailable".to_string()))
    }
}

/// Generator that replays canned responses in order and records each prompt.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        ScriptedGenerator {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> OracleResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OracleError::Generation("no scripted response left".to_string()))
    }
}
