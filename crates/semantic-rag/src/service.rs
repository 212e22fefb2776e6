//! RAG service: index construction and retrieval
//!
//! Ties a [`Corpus`](crate::Corpus) to an [`Embedder`] and a
//! [`VectorIndex`]. Building is insert-if-absent by document id, so running
//! it twice over an unchanged directory adds nothing the second time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use oracle_gateway::Embedder;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use vector_state::{IndexEntry, VectorIndex};

use crate::corpus::load_corpus;
use crate::error::{RagError, RagResult};

/// Number of documents retrieved when the caller does not say
pub const DEFAULT_N_RESULTS: usize = 3;

/// Outcome of one index build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Readable knowledge documents found
    pub discovered: usize,
    /// Files that could not be read
    pub skipped_files: usize,
    /// Documents whose id was already in the index
    pub already_indexed: usize,
    /// Documents embedded and stored by this build
    pub added: usize,
}

/// Snapshot of the index behind a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub collection: String,
    pub entries: usize,
    pub dimension: Option<usize>,
}

/// Retrieval over a knowledge directory.
pub struct RagService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    knowledge_dir: PathBuf,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        knowledge_dir: impl Into<PathBuf>,
    ) -> Self {
        RagService {
            embedder,
            index,
            knowledge_dir: knowledge_dir.into(),
        }
    }

    pub fn knowledge_dir(&self) -> &Path {
        &self.knowledge_dir
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Index every knowledge document not already present.
    ///
    /// An empty corpus is a warning, not an error. Embedding and index
    /// failures abort the build; nothing from the failed batch is stored.
    #[instrument(skip(self), fields(dir = %self.knowledge_dir.display(), collection = %self.index.collection()))]
    pub async fn build_or_load_index(&self) -> RagResult<BuildReport> {
        let corpus = load_corpus(&self.knowledge_dir);
        let mut report = BuildReport {
            discovered: corpus.len(),
            skipped_files: corpus.skipped.len(),
            ..Default::default()
        };

        if corpus.is_empty() {
            warn!("No knowledge documents found; index left unchanged");
            return Ok(report);
        }

        let mut pending = Vec::new();
        for document in corpus.documents {
            if self.index.contains(&document.id).await? {
                report.already_indexed += 1;
            } else {
                pending.push(document);
            }
        }

        if pending.is_empty() {
            info!(already_indexed = report.already_indexed, "Index already up to date");
            return Ok(report);
        }

        let texts: Vec<String> = pending.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts).await?;
        if vectors.len() != pending.len() {
            return Err(RagError::EmbeddingCountMismatch {
                expected: pending.len(),
                actual: vectors.len(),
            });
        }

        let entries: Vec<IndexEntry> = pending
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| {
                IndexEntry::new(document.id, vector, document.text)
                    .with_metadata(document.metadata)
            })
            .collect();
        report.added = entries.len();
        self.index.add(entries).await?;

        info!(
            added = report.added,
            already_indexed = report.already_indexed,
            total = self.index.count().await?,
            "Knowledge index built"
        );
        Ok(report)
    }

    /// Drop every entry of the collection, then build from scratch.
    #[instrument(skip(self), fields(collection = %self.index.collection()))]
    pub async fn rebuild_index(&self) -> RagResult<BuildReport> {
        let removed = self.index.clear().await?;
        info!(removed, "Index cleared for rebuild");
        self.build_or_load_index().await
    }

    /// Up to `n_results` documents most similar to `text`, best first.
    ///
    /// Retrieval is best effort: embedding or index failures are logged and
    /// yield an empty list.
    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, n_results: usize) -> Vec<String> {
        let vector = match self.embedder.embed_query(text).await {
            Ok(vector) => vector,
            Err(e) => {
                error!(error = %e, "Query embedding failed; continuing without retrieval");
                return Vec::new();
            }
        };

        match self.index.query(&vector, n_results).await {
            Ok(documents) => {
                info!(returned = documents.len(), "Retrieved knowledge documents");
                documents
            }
            Err(e) => {
                error!(error = %e, "Index query failed; continuing without retrieval");
                Vec::new()
            }
        }
    }

    pub async fn stats(&self) -> RagResult<IndexStats> {
        Ok(IndexStats {
            collection: self.index.collection().to_string(),
            entries: self.index.count().await?,
            dimension: self.index.dimension().await?,
        })
    }
}
