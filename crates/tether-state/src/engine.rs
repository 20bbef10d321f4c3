use std::sync::Arc;

use tether_core::{DocumentStore, Predicate, StoreError, TransactionOp};

use crate::error::StateError;

/// One row of an abort decision table.
///
/// When a transaction aborts, the engine walks the caller's rows in order and
/// stops at the first row that reaches a verdict. The order matters: rows
/// earlier in the table win even when a later row would also match.
#[derive(Debug, Clone)]
pub enum AbortCheck {
    /// The document we tried to insert now exists.
    AlreadyExists {
        kind: &'static str,
        collection: String,
        id: String,
        name: String,
    },
    /// Every referenced document still exists; names the first one that doesn't.
    ReferencesExist {
        kind: &'static str,
        collection: String,
        refs: Vec<(String, String)>,
    },
    /// The provider id reservation document does not exist yet.
    ProviderIdUnique {
        collection: String,
        key: String,
        provider_id: String,
    },
    /// The document already satisfies the goal, so the abort was a benign race.
    AlreadySatisfied {
        collection: String,
        id: String,
        predicate: Predicate,
    },
    /// Re-fetch the document under mutation; report `on_missing` if it is gone.
    Refetch {
        collection: String,
        id: String,
        on_missing: StateError,
    },
    /// Always fails with the given error.
    Otherwise(StateError),
}

enum Verdict {
    Continue,
    Resolved,
    Failed(StateError),
}

/// Applies op sequences and classifies aborts.
///
/// The engine never retries: the right follow-up depends on which assertion
/// failed, and only the caller can decide that.
pub struct TransactionEngine<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> Clone for TransactionEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: DocumentStore> TransactionEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Apply `ops` atomically; on abort, classify with `checks`.
    pub fn run(&self, ops: &[TransactionOp], checks: &[AbortCheck]) -> Result<(), StateError> {
        match self.store.apply(ops) {
            Ok(()) => {
                tracing::debug!(ops = ops.len(), "transaction applied");
                Ok(())
            }
            Err(StoreError::Aborted) => {
                let outcome = self.classify(checks);
                match &outcome {
                    Ok(()) => tracing::debug!("transaction aborted; goal already reached"),
                    Err(err) => tracing::warn!(error = %err, "transaction aborted"),
                }
                outcome
            }
            Err(err) => {
                tracing::warn!(error = %err, "transaction failed");
                Err(StateError::unavailable(err))
            }
        }
    }

    /// Walk the decision table. Falls back to `Conflict` when no row fires.
    pub fn classify(&self, checks: &[AbortCheck]) -> Result<(), StateError> {
        for check in checks {
            match self.evaluate(check)? {
                Verdict::Continue => continue,
                Verdict::Resolved => return Ok(()),
                Verdict::Failed(err) => return Err(err),
            }
        }
        Err(StateError::Conflict(
            "transaction aborted by a concurrent change".to_string(),
        ))
    }

    fn evaluate(&self, check: &AbortCheck) -> Result<Verdict, StateError> {
        let verdict = match check {
            AbortCheck::AlreadyExists {
                kind,
                collection,
                id,
                name,
            } => {
                if self.exists(collection, id)? {
                    Verdict::Failed(StateError::AlreadyExists {
                        kind: *kind,
                        id: name.clone(),
                    })
                } else {
                    Verdict::Continue
                }
            }
            AbortCheck::ReferencesExist {
                kind,
                collection,
                refs,
            } => {
                for (id, name) in refs {
                    if !self.exists(collection, id)? {
                        return Ok(Verdict::Failed(StateError::ReferenceNotFound {
                            kind: *kind,
                            id: name.clone(),
                        }));
                    }
                }
                Verdict::Continue
            }
            AbortCheck::ProviderIdUnique {
                collection,
                key,
                provider_id,
            } => {
                if self.exists(collection, key)? {
                    Verdict::Failed(StateError::ProviderIdNotUnique(provider_id.clone()))
                } else {
                    Verdict::Continue
                }
            }
            AbortCheck::AlreadySatisfied {
                collection,
                id,
                predicate,
            } => match self.store.find_by_id(collection, id) {
                Ok(doc) if predicate.matches(&doc) => Verdict::Resolved,
                Ok(_) => Verdict::Continue,
                Err(err) if err.is_not_found() => Verdict::Continue,
                Err(err) => return Err(StateError::unavailable(err)),
            },
            AbortCheck::Refetch {
                collection,
                id,
                on_missing,
            } => {
                if self.exists(collection, id)? {
                    Verdict::Continue
                } else {
                    Verdict::Failed(on_missing.clone())
                }
            }
            AbortCheck::Otherwise(err) => Verdict::Failed(err.clone()),
        };
        Ok(verdict)
    }

    fn exists(&self, collection: &str, id: &str) -> Result<bool, StateError> {
        match self.store.find_by_id(collection, id) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(StateError::unavailable(err)),
        }
    }
}
