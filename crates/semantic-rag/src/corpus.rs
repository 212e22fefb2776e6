//! Knowledge corpus discovery
//!
//! Every `.md` file under the knowledge directory becomes one document.
//! Paths are sorted before ids are handed out, so the same tree always
//! yields the same `"1"`, `"2"`, ... assignment.

use std::path::{Path, PathBuf};

use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File extension of knowledge documents
pub const KNOWLEDGE_EXTENSION: &str = "md";

/// One knowledge file, read in full.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeDocument {
    /// Sequential id, unique within one load
    pub id: String,
    pub path: PathBuf,
    pub text: String,
    /// `{"source": <path>, "sha256": <hex>}`
    pub metadata: serde_json::Value,
}

/// A file that was discovered but could not be read as UTF-8 text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to read {}: {reason}", .path.display())]
pub struct CorpusReadError {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading a knowledge directory.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<KnowledgeDocument>,
    /// Files skipped because they could not be read
    pub skipped: Vec<CorpusReadError>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.id.clone()).collect()
    }

    pub fn metadatas(&self) -> Vec<serde_json::Value> {
        self.documents.iter().map(|d| d.metadata.clone()).collect()
    }
}

/// Load every knowledge document under `dir`.
///
/// A missing directory or one without matching files yields an empty
/// corpus. Unreadable files are logged and reported in `skipped`; they do
/// not consume an id.
pub fn load_corpus(dir: &Path) -> Corpus {
    let mut corpus = Corpus::default();

    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Knowledge directory not found");
        return corpus;
    }

    let mut files = Vec::new();
    walkdir(dir, &mut files, &mut corpus.skipped);
    files.retain(|path| {
        path.extension()
            .map(|ext| ext == KNOWLEDGE_EXTENSION)
            .unwrap_or(false)
    });
    files.sort();

    for path in files {
        match read_text(&path) {
            Ok((text, digest)) => {
                let id = (corpus.documents.len() + 1).to_string();
                debug!(%id, path = %path.display(), "Knowledge document loaded");
                corpus.documents.push(KnowledgeDocument {
                    metadata: json!({
                        "source": path.display().to_string(),
                        "sha256": digest,
                    }),
                    id,
                    path,
                    text,
                });
            }
            Err(err) => {
                warn!(path = %err.path.display(), reason = %err.reason, "Skipping unreadable knowledge file");
                corpus.skipped.push(err);
            }
        }
    }

    info!(
        dir = %dir.display(),
        documents = corpus.documents.len(),
        skipped = corpus.skipped.len(),
        "Knowledge corpus loaded"
    );
    corpus
}

/// Read a file as UTF-8 and hash its bytes.
fn read_text(path: &Path) -> Result<(String, String), CorpusReadError> {
    let fail = |reason: String| CorpusReadError {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| fail(e.to_string()))?;
    let digest = hex::encode(Sha256::digest(&bytes));
    let text = String::from_utf8(bytes).map_err(|e| fail(format!("not valid UTF-8: {}", e)))?;
    Ok((text, digest))
}

/// Recursive directory walk; unreadable directories are reported, not fatal.
fn walkdir(dir: &Path, files: &mut Vec<PathBuf>, skipped: &mut Vec<CorpusReadError>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
            skipped.push(CorpusReadError {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            });
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walkdir(&path, files, skipped);
        } else {
            files.push(path);
        }
    }
}
