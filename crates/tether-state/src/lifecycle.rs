use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use tether_core::{
    from_document, to_document, Assertion, CollectionKind, Document, DocumentStore, Life,
    Predicate, Query, TransactionOp,
};

use crate::engine::{AbortCheck, TransactionEngine};
use crate::error::StateError;
use crate::model::ModelContext;

/// An entity kind whose documents follow the Alive -> Dying -> Dead life cycle.
///
/// Implementors are plain values: they hold no store handle, and every change
/// to the stored document goes through an `EntityLifecycle` given its id.
pub trait ManagedEntity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection the documents live in.
    const COLLECTION: CollectionKind;
    /// Singular name used in error messages, e.g. "space".
    const KIND: &'static str;

    /// Model-scoped document id.
    fn doc_id(&self) -> &str;

    /// The natural key users know the entity by.
    fn name(&self) -> &str;

    fn life(&self) -> Life;

    /// Ops removing denormalized entries tied to this entity. They run in the
    /// same transaction as the entity's removal.
    fn cleanup_ops(&self, _model: &ModelContext) -> Vec<TransactionOp> {
        Vec::new()
    }
}

fn life_of(doc: &Document) -> Option<Life> {
    doc.get("life")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Generic life-cycle operations for one entity kind.
pub struct EntityLifecycle<E, S: DocumentStore> {
    engine: TransactionEngine<S>,
    model: ModelContext,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S: DocumentStore> Clone for EntityLifecycle<E, S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            model: self.model.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: ManagedEntity, S: DocumentStore> EntityLifecycle<E, S> {
    pub fn new(engine: TransactionEngine<S>, model: ModelContext) -> Self {
        Self {
            engine,
            model,
            _entity: PhantomData,
        }
    }

    fn collection(&self) -> &str {
        self.model.collection(E::COLLECTION)
    }

    // Error messages name the entity by its natural key, not the scoped id.
    fn local_id<'a>(&self, doc_id: &'a str) -> &'a str {
        let prefix = format!("{}:", self.model.model_uuid());
        doc_id.strip_prefix(prefix.as_str()).unwrap_or(doc_id)
    }

    /// Insert a new entity together with `extra_ops`, all in one transaction.
    ///
    /// The entity's own insert always comes first and asserts the id is free.
    pub fn insert(
        &self,
        entity: &E,
        extra_ops: Vec<TransactionOp>,
        checks: &[AbortCheck],
    ) -> Result<(), StateError> {
        let mut ops = vec![TransactionOp::new(self.collection(), entity.doc_id())
            .assert(Assertion::Missing)
            .insert(to_document(entity)?)];
        ops.extend(extra_ops);

        self.engine.run(&ops, checks)?;
        tracing::info!(kind = E::KIND, name = entity.name(), "created");
        Ok(())
    }

    /// The decision-table row reporting a lost creation race.
    pub fn already_exists_check(&self, entity: &E) -> AbortCheck {
        AbortCheck::AlreadyExists {
            kind: E::KIND,
            collection: self.collection().to_string(),
            id: entity.doc_id().to_string(),
            name: entity.name().to_string(),
        }
    }

    /// Re-read the stored entity.
    pub fn refresh(&self, doc_id: &str) -> Result<E, StateError> {
        match self.engine.store().find_by_id(self.collection(), doc_id) {
            Ok(doc) => Ok(from_document(doc)?),
            Err(err) if err.is_not_found() => Err(StateError::NotFound {
                kind: E::KIND,
                id: self.local_id(doc_id).to_string(),
            }),
            Err(err) => Err(StateError::unavailable(err)),
        }
    }

    pub fn find(&self, query: &Query) -> Result<Vec<E>, StateError> {
        let docs = self
            .engine
            .store()
            .find_many(self.collection(), query)
            .map_err(StateError::unavailable)?;

        let mut entities = docs
            .into_iter()
            .map(from_document::<E>)
            .collect::<Result<Vec<_>, _>>()?;
        entities.sort_by(|a, b| a.doc_id().cmp(b.doc_id()));
        Ok(entities)
    }

    /// Every entity of this kind in the model.
    pub fn list(&self) -> Result<Vec<E>, StateError> {
        self.find(&Query::all().field_eq("model-uuid", self.model.model_uuid().to_string()))
    }

    /// Move an Alive entity to Dying. No-op if it is already Dying or Dead.
    pub fn ensure_dying(&self, doc_id: &str) -> Result<(), StateError> {
        self.advance(doc_id, Life::Dying)
    }

    /// Move an Alive or Dying entity to Dead. No-op if it is already Dead.
    pub fn ensure_dead(&self, doc_id: &str) -> Result<(), StateError> {
        self.advance(doc_id, Life::Dead)
    }

    fn advance(&self, doc_id: &str, target: Life) -> Result<(), StateError> {
        let not_alive = StateError::NotAlive {
            kind: E::KIND,
            id: self.local_id(doc_id).to_string(),
        };

        let current = match self.refresh(doc_id) {
            Ok(entity) => entity,
            Err(err) if err.is_not_found() => return Err(not_alive),
            Err(err) => return Err(err),
        };
        if current.life().is_at_least(target) {
            return Ok(());
        }

        let ops = [TransactionOp::new(self.collection(), doc_id)
            .assert(Assertion::Custom(Predicate::new("life-precedes-target", move |doc| {
                life_of(doc).is_some_and(|life| life < target)
            })))
            .set_field("life", target.as_str())];

        let checks = [
            AbortCheck::AlreadySatisfied {
                collection: self.collection().to_string(),
                id: doc_id.to_string(),
                predicate: Predicate::new("life-reached-target", move |doc| {
                    life_of(doc).is_some_and(|life| life.is_at_least(target))
                }),
            },
            AbortCheck::Refetch {
                collection: self.collection().to_string(),
                id: doc_id.to_string(),
                on_missing: not_alive,
            },
        ];

        self.engine.run(&ops, &checks)?;
        tracing::info!(kind = E::KIND, name = current.name(), life = %target, "life advanced");
        Ok(())
    }

    /// Remove a Dead entity and any denormalized entries tied to it.
    pub fn remove(&self, doc_id: &str) -> Result<(), StateError> {
        let not_dead = StateError::NotDeadOrNotFound {
            kind: E::KIND,
            id: self.local_id(doc_id).to_string(),
        };

        let current = match self.refresh(doc_id) {
            Ok(entity) => entity,
            Err(err) if err.is_not_found() => return Err(not_dead),
            Err(err) => return Err(err),
        };
        if current.life() != Life::Dead {
            return Err(not_dead);
        }

        let mut ops = vec![TransactionOp::new(self.collection(), doc_id)
            .assert(Assertion::field_equals("life", Life::Dead.as_str()))
            .remove()];
        ops.extend(current.cleanup_ops(&self.model));

        self.engine.run(&ops, &[AbortCheck::Otherwise(not_dead)])?;
        tracing::info!(kind = E::KIND, name = current.name(), "removed");
        Ok(())
    }
}
