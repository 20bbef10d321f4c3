//! Tether DB - redb implementation of the document store.

pub mod document_store;
pub mod tables;

pub use document_store::RedbDocumentStore;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

use tether_core::StoreError;

/// Initialize a database with all required tables.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StoreError> {
    let db = Database::create(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

    RedbDocumentStore::init_tables(&db)?;

    Ok(Arc::new(db))
}

/// Open (or create) the database at `path` and wrap it in a document store.
pub fn open_store(path: impl AsRef<Path>) -> Result<Arc<RedbDocumentStore>, StoreError> {
    let path = path.as_ref();
    let db = init_database(path)?;
    tracing::info!(path = %path.display(), "document store opened");
    Ok(Arc::new(RedbDocumentStore::new(db)))
}
