//! On-disk behaviour of the SurrealDB index (embedded surrealkv engine).

use vector_state::{IndexEntry, StorageLocation, SurrealVectorIndex, VectorIndex};

#[tokio::test]
async fn open_or_create_initializes_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("nested").join("index");
    let location = StorageLocation::Path(store.clone());

    let index = SurrealVectorIndex::open_or_create(&location, "kb")
        .await
        .unwrap();

    assert!(store.exists());
    assert_eq!(index.count().await.unwrap(), 0);

    index
        .add(vec![IndexEntry::new(
            "1",
            vec![0.1, 0.2, 0.3],
            "Login flow requires username and password.",
        )])
        .await
        .unwrap();
    assert_eq!(index.count().await.unwrap(), 1);
}

// The embedded engine releases its file lock asynchronously on drop.
#[tokio::test]
async fn entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let location = StorageLocation::Path(dir.path().join("index"));

    {
        let index = SurrealVectorIndex::open_or_create(&location, "kb").await.unwrap();
        index
            .add(vec![
                IndexEntry::new("1", vec![1.0, 0.0], "Login flow requires username and password."),
                IndexEntry::new("2", vec![0.0, 1.0], "Checkout flow validates cart total."),
            ])
            .await
            .unwrap();
    }
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let reopened = SurrealVectorIndex::open_or_create(&location, "kb").await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 2);
    assert_eq!(reopened.dimension().await.unwrap(), Some(2));
    let docs = reopened.query(&[0.0, 1.0], 1).await.unwrap();
    assert_eq!(docs, vec!["Checkout flow validates cart total.".to_string()]);
}
