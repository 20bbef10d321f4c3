use std::sync::Arc;

use redb::{Database, ReadableTable, Table};

use tether_core::{Document, DocumentStore, DocumentWrite, Query, StoreError, TransactionOp};

use crate::tables::{collection_range, encode_doc_key, DOCUMENTS_TABLE};

/// redb implementation of DocumentStore.
///
/// Each `apply` runs inside a single redb write transaction. redb serializes
/// writers, so assertions are evaluated against a state no other writer can
/// change before commit; any failed assertion aborts the write transaction.
pub struct RedbDocumentStore {
    db: Arc<Database>,
}

impl RedbDocumentStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StoreError> {
        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(DOCUMENTS_TABLE)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn apply_ops(
        table: &mut Table<'_, &'static [u8], &'static [u8]>,
        ops: &[TransactionOp],
    ) -> Result<(), StoreError> {
        for op in ops {
            let key = encode_doc_key(&op.collection, &op.id);

            let current: Option<Document> = table
                .get(key.as_slice())
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .map(|value| serde_json::from_slice(value.value()))
                .transpose()
                .map_err(|e| StoreError::Codec(e.to_string()))?;

            if !op.assertion.holds(current.as_ref()) {
                tracing::debug!(
                    collection = %op.collection,
                    id = %op.id,
                    assertion = ?op.assertion,
                    "assertion failed"
                );
                return Err(StoreError::Aborted);
            }

            match op.mutation.resolve(current.as_ref()) {
                DocumentWrite::Keep => {}
                DocumentWrite::Put(doc) => {
                    let value =
                        serde_json::to_vec(&doc).map_err(|e| StoreError::Codec(e.to_string()))?;
                    table
                        .insert(key.as_slice(), value.as_slice())
                        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                }
                DocumentWrite::Delete => {
                    table
                        .remove(key.as_slice())
                        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                }
            }
        }
        Ok(())
    }
}

impl DocumentStore for RedbDocumentStore {
    fn apply(&self, ops: &[TransactionOp]) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let outcome = {
            let mut table = write_txn
                .open_table(DOCUMENTS_TABLE)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            Self::apply_ops(&mut table, ops)
        };

        match outcome {
            Ok(()) => {
                write_txn
                    .commit()
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                tracing::debug!(ops = ops.len(), "transaction committed");
                Ok(())
            }
            Err(err) => {
                write_txn
                    .abort()
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                Err(err)
            }
        }
    }

    fn find_by_id(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let table = read_txn
            .open_table(DOCUMENTS_TABLE)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let key = encode_doc_key(collection, id);
        match table
            .get(key.as_slice())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        {
            Some(value) => {
                serde_json::from_slice(value.value()).map_err(|e| StoreError::Codec(e.to_string()))
            }
            None => Err(StoreError::not_found(collection, id)),
        }
    }

    fn find_many(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let table = read_txn
            .open_table(DOCUMENTS_TABLE)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let (start, end) = collection_range(collection);
        let range = table
            .range(start.as_slice()..end.as_slice())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut docs = Vec::new();
        for entry in range {
            let (_, value) = entry.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let doc: Document = serde_json::from_slice(value.value())
                .map_err(|e| StoreError::Codec(e.to_string()))?;
            if query.matches(&doc) {
                docs.push(doc);
            }
        }

        Ok(docs)
    }
}
