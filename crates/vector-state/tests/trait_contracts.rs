//! Trait contract tests for VectorIndex.
//!
//! Every behavioural guarantee documented on the trait is checked against
//! both the in-memory fake and the SurrealDB backend (`mem://` engine).

use vector_state::fakes::MemoryVectorIndex;
use vector_state::{IndexEntry, StorageError, SurrealVectorIndex, VectorIndex};

fn login_and_checkout() -> Vec<IndexEntry> {
    vec![
        IndexEntry::new("1", vec![1.0, 0.0, 0.2], "Login flow requires username and password.")
            .with_metadata(serde_json::json!({"source": "kb/login.md"})),
        IndexEntry::new("2", vec![0.0, 1.0, 0.2], "Checkout flow validates cart total.")
            .with_metadata(serde_json::json!({"source": "kb/checkout.md"})),
    ]
}

async fn check_empty_collection_queries_empty(index: &dyn VectorIndex) {
    assert_eq!(index.count().await.unwrap(), 0);
    let docs = index.query(&[1.0, 0.0, 0.0], 3).await.unwrap();
    assert!(docs.is_empty());
}

async fn check_add_increases_count(index: &dyn VectorIndex) {
    index.add(login_and_checkout()).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 2);
    assert!(index.contains("1").await.unwrap());
    assert_eq!(index.dimension().await.unwrap(), Some(3));
}

async fn check_query_returns_nearest_first(index: &dyn VectorIndex) {
    index.add(login_and_checkout()).await.unwrap();

    let docs = index.query(&[0.9, 0.1, 0.0], 1).await.unwrap();
    assert_eq!(docs, vec!["Login flow requires username and password.".to_string()]);

    let hits = index.query_scored(&[0.0, 1.0, 0.0], 2).await.unwrap();
    assert_eq!(hits[0].id, "2");
    assert_eq!(hits[1].id, "1");
    assert!(hits[0].score > hits[1].score);
}

async fn check_query_never_pads(index: &dyn VectorIndex) {
    index.add(login_and_checkout()).await.unwrap();
    let docs = index.query(&[1.0, 1.0, 1.0], 10).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| !d.is_empty()));
}

async fn check_zero_k_returns_empty(index: &dyn VectorIndex) {
    index.add(login_and_checkout()).await.unwrap();
    assert!(index.query(&[1.0, 0.0, 0.0], 0).await.unwrap().is_empty());
}

async fn check_duplicate_id_rejected_without_partial_write(index: &dyn VectorIndex) {
    index.add(login_and_checkout()).await.unwrap();

    let batch = vec![
        IndexEntry::new("3", vec![0.5, 0.5, 0.0], "Profile page edits display name."),
        IndexEntry::new("1", vec![0.5, 0.5, 0.0], "Replacement login text."),
    ];
    let err = index.add(batch).await.unwrap_err();
    assert!(matches!(err, StorageError::DuplicateId { ref id, .. } if id == "1"));

    assert_eq!(index.count().await.unwrap(), 2);
    assert!(!index.contains("3").await.unwrap());
    let docs = index.query(&[1.0, 0.0, 0.0], 1).await.unwrap();
    assert_eq!(docs[0], "Login flow requires username and password.");
}

async fn check_dimension_enforced(index: &dyn VectorIndex) {
    index.add(login_and_checkout()).await.unwrap();

    let err = index
        .add(vec![IndexEntry::new("9", vec![1.0, 0.0], "short vector")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::DimensionMismatch {
            expected: 3,
            actual: 2,
            ..
        }
    ));

    let err = index.query(&[1.0], 1).await.unwrap_err();
    assert!(matches!(err, StorageError::DimensionMismatch { .. }));
}

async fn check_clear_empties_collection(index: &dyn VectorIndex) {
    index.add(login_and_checkout()).await.unwrap();
    assert_eq!(index.clear().await.unwrap(), 2);
    assert_eq!(index.count().await.unwrap(), 0);
    assert!(index.query(&[1.0, 0.0, 0.0], 3).await.unwrap().is_empty());
}

async fn check_non_finite_batch_leaves_collection_unchanged(index: &dyn VectorIndex) {
    let batch = vec![
        IndexEntry::new("1", vec![1.0, 0.0, 0.0], "Valid first entry."),
        IndexEntry::new("2", vec![f32::NAN, 0.0, 0.0], "Corrupt second entry."),
    ];
    let err = index.add(batch).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidEntry(_)));
    assert_eq!(index.count().await.unwrap(), 0);
    assert_eq!(index.dimension().await.unwrap(), None);

    index.add(login_and_checkout()).await.unwrap();
    let batch = vec![
        IndexEntry::new("3", vec![0.5, 0.5, 0.0], "Profile page edits display name."),
        IndexEntry::new("4", vec![f32::INFINITY, 0.0, 0.0], "Overflowed embedding."),
    ];
    assert!(index.add(batch).await.is_err());
    assert_eq!(index.count().await.unwrap(), 2);
    assert_eq!(index.dimension().await.unwrap(), Some(3));
    assert!(!index.contains("3").await.unwrap());

    let docs = index.query(&[1.0, 0.0, 0.0], 3).await.unwrap();
    assert_eq!(docs.len(), 2);
    let err = index.query(&[f32::NAN, 0.0, 0.0], 3).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidEntry(_)));
}

macro_rules! contract_tests {
    ($backend:ident, $make:expr) => {
        mod $backend {
            use super::*;

            #[tokio::test]
            async fn empty_collection_queries_empty() {
                let index = $make;
                check_empty_collection_queries_empty(&index).await;
            }

            #[tokio::test]
            async fn add_increases_count() {
                let index = $make;
                check_add_increases_count(&index).await;
            }

            #[tokio::test]
            async fn query_returns_nearest_first() {
                let index = $make;
                check_query_returns_nearest_first(&index).await;
            }

            #[tokio::test]
            async fn query_never_pads() {
                let index = $make;
                check_query_never_pads(&index).await;
            }

            #[tokio::test]
            async fn zero_k_returns_empty() {
                let index = $make;
                check_zero_k_returns_empty(&index).await;
            }

            #[tokio::test]
            async fn duplicate_id_rejected_without_partial_write() {
                let index = $make;
                check_duplicate_id_rejected_without_partial_write(&index).await;
            }

            #[tokio::test]
            async fn dimension_enforced() {
                let index = $make;
                check_dimension_enforced(&index).await;
            }

            #[tokio::test]
            async fn non_finite_batch_leaves_collection_unchanged() {
                let index = $make;
                check_non_finite_batch_leaves_collection_unchanged(&index).await;
            }

            #[tokio::test]
            async fn clear_empties_collection() {
                let index = $make;
                check_clear_empties_collection(&index).await;
            }
        }
    };
}

contract_tests!(memory, MemoryVectorIndex::new("kb"));
contract_tests!(surreal, SurrealVectorIndex::in_memory("kb").await.unwrap());
