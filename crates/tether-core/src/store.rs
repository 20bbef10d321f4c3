use serde_json::Value;

use crate::document::Document;
use crate::error::StoreError;
use crate::txn::TransactionOp;

/// A conjunction of field equalities used to select documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
}

impl Query {
    /// Match every document in a collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// Boundary to the underlying document store.
///
/// Implementations must apply a transaction all-or-nothing: either every op's
/// assertion holds and every mutation becomes visible together, or
/// `StoreError::Aborted` is returned and nothing changes. Ops within one
/// transaction observe the effects of earlier ops in the same transaction.
pub trait DocumentStore: Send + Sync {
    /// Atomically apply a sequence of conditional ops.
    fn apply(&self, ops: &[TransactionOp]) -> Result<(), StoreError>;

    /// Fetch one document. Returns `StoreError::NotFound` when absent.
    fn find_by_id(&self, collection: &str, id: &str) -> Result<Document, StoreError>;

    /// Fetch every document in a collection matching the query, ordered by id.
    fn find_many(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn apply(&self, ops: &[TransactionOp]) -> Result<(), StoreError> {
        (**self).apply(ops)
    }

    fn find_by_id(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        (**self).find_by_id(collection, id)
    }

    fn find_many(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        (**self).find_many(collection, query)
    }
}

// In-memory implementation for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use crate::txn::DocumentWrite;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, RwLock};

    type Key = (String, String);
    type Hook = Box<dyn FnOnce() + Send>;

    /// In-memory document store for testing.
    ///
    /// Besides the store contract it can simulate racing writers: hooks queued
    /// with `set_before_apply` run, one per call, just before the next
    /// transactions are applied. Transactions issued from inside a hook do not
    /// consume further hooks.
    #[derive(Default)]
    pub struct InMemoryDocumentStore {
        docs: RwLock<BTreeMap<Key, Document>>,
        hooks: Mutex<VecDeque<Hook>>,
        in_hook: AtomicUsize,
        failures: Mutex<VecDeque<StoreError>>,
        read_failures: Mutex<VecDeque<StoreError>>,
    }

    impl InMemoryDocumentStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a hook to run before the next un-hooked `apply`.
        pub fn set_before_apply(&self, hook: impl FnOnce() + Send + 'static) {
            self.hooks.lock().unwrap().push_back(Box::new(hook));
        }

        /// Make the next `apply` fail with `err` without touching any document.
        pub fn fail_next_apply(&self, err: StoreError) {
            self.failures.lock().unwrap().push_back(err);
        }

        /// Make the next `find_by_id` or `find_many` fail with `err`.
        pub fn fail_next_find(&self, err: StoreError) {
            self.read_failures.lock().unwrap().push_back(err);
        }

        fn injected_read_failure(&self) -> Result<(), StoreError> {
            match self.read_failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        /// Number of documents across all collections.
        pub fn len(&self) -> usize {
            self.docs.read().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn run_hook(&self) {
            if self.in_hook.load(Ordering::SeqCst) > 0 {
                return;
            }
            let hook = self.hooks.lock().unwrap().pop_front();
            if let Some(hook) = hook {
                self.in_hook.fetch_add(1, Ordering::SeqCst);
                hook();
                self.in_hook.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    impl DocumentStore for InMemoryDocumentStore {
        fn apply(&self, ops: &[TransactionOp]) -> Result<(), StoreError> {
            self.run_hook();

            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }

            let mut docs = self.docs.write().unwrap();

            // Stage every write so later ops see earlier ones, then commit at once.
            let mut staged: BTreeMap<Key, Option<Document>> = BTreeMap::new();
            for op in ops {
                let key = (op.collection.clone(), op.id.clone());
                let current = match staged.get(&key) {
                    Some(doc) => doc.clone(),
                    None => docs.get(&key).cloned(),
                };

                if !op.assertion.holds(current.as_ref()) {
                    return Err(StoreError::Aborted);
                }

                match op.mutation.resolve(current.as_ref()) {
                    DocumentWrite::Keep => {}
                    DocumentWrite::Put(doc) => {
                        staged.insert(key, Some(doc));
                    }
                    DocumentWrite::Delete => {
                        staged.insert(key, None);
                    }
                }
            }

            for (key, doc) in staged {
                match doc {
                    Some(doc) => {
                        docs.insert(key, doc);
                    }
                    None => {
                        docs.remove(&key);
                    }
                }
            }
            Ok(())
        }

        fn find_by_id(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
            self.injected_read_failure()?;
            self.docs
                .read()
                .unwrap()
                .get(&(collection.to_string(), id.to_string()))
                .cloned()
                .ok_or_else(|| StoreError::not_found(collection, id))
        }

        fn find_many(
            &self,
            collection: &str,
            query: &Query,
        ) -> Result<Vec<Document>, StoreError> {
            self.injected_read_failure()?;
            let docs = self.docs.read().unwrap();
            Ok(docs
                .iter()
                .filter(|((c, _), doc)| c == collection && query.matches(doc))
                .map(|(_, doc)| doc.clone())
                .collect())
        }
    }

}
