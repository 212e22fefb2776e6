//! RagService behaviour against the in-memory index and keyword embedder.

use std::path::Path;
use std::sync::Arc;

use oracle_gateway::fakes::{FailingEmbedder, KeywordEmbedder};
use semantic_rag::{RagError, RagService};
use vector_state::fakes::MemoryVectorIndex;
use vector_state::{SurrealVectorIndex, VectorIndex};

const VOCABULARY: [&str; 4] = ["login", "checkout", "cart", "password"];

const LOGIN_DOC: &str = "Login flow requires username and password.";
const CHECKOUT_DOC: &str = "Checkout flow validates cart total.";

fn write_knowledge(dir: &Path) {
    std::fs::write(dir.join("login.md"), LOGIN_DOC).unwrap();
    std::fs::write(dir.join("checkout.md"), CHECKOUT_DOC).unwrap();
}

fn service_with(dir: &Path, index: Arc<dyn VectorIndex>) -> (RagService, Arc<KeywordEmbedder>) {
    let embedder = Arc::new(KeywordEmbedder::new(&VOCABULARY));
    let service = RagService::new(embedder.clone(), index, dir);
    (service, embedder)
}

#[tokio::test]
async fn login_query_returns_login_document() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    let (service, _) = service_with(dir.path(), index);

    let report = service.build_or_load_index().await.unwrap();
    assert_eq!(report.added, 2);

    let docs = service.query("Login screen with password field", 1).await;
    assert_eq!(docs, vec![LOGIN_DOC.to_string()]);
}

#[tokio::test]
async fn button_click_query_finds_login_flow() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let (service, _) = service_with(dir.path(), Arc::new(MemoryVectorIndex::new("kb")));
    service.build_or_load_index().await.unwrap();

    let docs = service.query("test login button click", 1).await;
    assert_eq!(docs, vec![LOGIN_DOC.to_string()]);
}

#[tokio::test]
async fn build_adds_exactly_the_new_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    let (service, _) = service_with(dir.path(), index.clone());

    let before = index.count().await.unwrap();
    service.build_or_load_index().await.unwrap();
    assert_eq!(index.count().await.unwrap(), before + 2);

    let entries = index.entries();
    assert_eq!(entries[0].id, "1");
    assert_eq!(entries[0].document, CHECKOUT_DOC);
    assert!(entries[0].metadata["source"]
        .as_str()
        .unwrap()
        .ends_with("checkout.md"));
}

#[tokio::test]
async fn rerun_over_unchanged_directory_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    let (service, embedder) = service_with(dir.path(), index.clone());

    service.build_or_load_index().await.unwrap();
    let report = service.build_or_load_index().await.unwrap();

    assert_eq!(report.already_indexed, 2);
    assert_eq!(report.added, 0);
    assert_eq!(index.count().await.unwrap(), 2);
    assert_eq!(embedder.document_calls(), 1);
}

#[tokio::test]
async fn empty_corpus_leaves_index_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    let (service, embedder) = service_with(dir.path(), index.clone());

    let report = service.build_or_load_index().await.unwrap();

    assert_eq!(report.discovered, 0);
    assert_eq!(index.count().await.unwrap(), 0);
    assert_eq!(embedder.document_calls(), 0);
}

#[tokio::test]
async fn rebuild_reindexes_changed_content() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    let (service, _) = service_with(dir.path(), index.clone());
    service.build_or_load_index().await.unwrap();

    std::fs::write(dir.path().join("checkout.md"), "Cart checkout applies coupons.").unwrap();
    let report = service.rebuild_index().await.unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(index.count().await.unwrap(), 2);
    let docs = service.query("cart", 1).await;
    assert_eq!(docs, vec!["Cart checkout applies coupons.".to_string()]);
}

#[tokio::test]
async fn failing_embedder_query_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    let service = RagService::new(Arc::new(FailingEmbedder), index, dir.path());

    assert!(service.query("anything", 3).await.is_empty());
}

#[tokio::test]
async fn failing_embedder_aborts_build_without_writes() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    let service = RagService::new(Arc::new(FailingEmbedder), index.clone(), dir.path());

    let err = service.build_or_load_index().await.unwrap_err();
    assert!(matches!(err, RagError::Oracle(_)));
    assert_eq!(index.count().await.unwrap(), 0);
}

#[tokio::test]
async fn query_against_mismatched_index_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let index = Arc::new(MemoryVectorIndex::new("kb"));
    index
        .add(vec![vector_state::IndexEntry::new("x", vec![1.0, 0.0], "two dims")])
        .await
        .unwrap();
    let (service, _) = service_with(dir.path(), index);

    // Four-keyword query vector against a two-dimensional collection.
    assert!(service.query("login", 3).await.is_empty());
}

#[tokio::test]
async fn works_against_surreal_backend() {
    let dir = tempfile::tempdir().unwrap();
    write_knowledge(dir.path());
    let index = Arc::new(SurrealVectorIndex::in_memory("kb").await.unwrap());
    let (service, _) = service_with(dir.path(), index);

    service.build_or_load_index().await.unwrap();
    let stats = service.stats().await.unwrap();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.dimension, Some(VOCABULARY.len()));

    let docs = service.query("checkout cart", 2).await;
    assert_eq!(docs[0], CHECKOUT_DOC);
}
