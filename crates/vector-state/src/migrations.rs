//! SurrealDB schema initialization for the index tables
//!
//! Every statement uses `IF NOT EXISTS`, so attaching to an existing store
//! never redefines or drops anything.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Initialize the index tables. Safe to call on every open (idempotent).
pub(crate) async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing index schema");

    init_entries_table(db).await?;
    init_collections_table(db).await?;

    debug!("Index schema initialized");
    Ok(())
}

/// Initialize `index_entries`
///
/// Schema:
/// ```text
/// TABLE index_entries {
///   collection:  STRING (indexed)
///   doc_id:      STRING (unique per collection)
///   seq:         INT    (insertion order)
///   document:    STRING
///   embedding:   ARRAY<FLOAT>
///   metadata:    OBJECT
///   created_at:  DATETIME
/// }
/// ```
async fn init_entries_table(db: &Surreal<Any>) -> StorageResult<()> {
    let sql = r#"
        DEFINE TABLE IF NOT EXISTS index_entries SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS collection ON index_entries TYPE string;
        DEFINE FIELD IF NOT EXISTS doc_id ON index_entries TYPE string;
        DEFINE FIELD IF NOT EXISTS seq ON index_entries TYPE int;
        DEFINE FIELD IF NOT EXISTS document ON index_entries TYPE string;
        DEFINE FIELD IF NOT EXISTS embedding ON index_entries TYPE array<float>;
        DEFINE FIELD IF NOT EXISTS metadata ON index_entries FLEXIBLE TYPE object;
        DEFINE FIELD IF NOT EXISTS created_at ON index_entries TYPE datetime;
        DEFINE INDEX IF NOT EXISTS idx_entry_collection ON index_entries FIELDS collection;
        DEFINE INDEX IF NOT EXISTS idx_entry_doc ON index_entries FIELDS collection, doc_id UNIQUE;
    "#;

    db.query(sql)
        .await
        .and_then(|response| response.check())
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;
    Ok(())
}

/// Initialize `collections`
///
/// Schema:
/// ```text
/// TABLE collections {
///   name:        STRING (unique)
///   dimension:   INT
///   created_at:  DATETIME
/// }
/// ```
async fn init_collections_table(db: &Surreal<Any>) -> StorageResult<()> {
    let sql = r#"
        DEFINE TABLE IF NOT EXISTS collections SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS name ON collections TYPE string;
        DEFINE FIELD IF NOT EXISTS dimension ON collections TYPE int;
        DEFINE FIELD IF NOT EXISTS created_at ON collections TYPE datetime;
        DEFINE INDEX IF NOT EXISTS idx_collection_name ON collections FIELDS name UNIQUE;
    "#;

    db.query(sql)
        .await
        .and_then(|response| response.check())
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;
    Ok(())
}
