use std::sync::Arc;

use uuid::Uuid;

use tether_core::{Collections, DocumentStore};

use crate::config::Config;
use crate::engine::TransactionEngine;
use crate::lifecycle::EntityLifecycle;
use crate::model::ModelContext;
use crate::space::Space;
use crate::subnet::Subnet;

/// Entry point to one model's persistent state.
///
/// Cheap to clone; clones share the same store.
pub struct State<S: DocumentStore> {
    engine: TransactionEngine<S>,
    model: ModelContext,
}

impl<S: DocumentStore> Clone for State<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            model: self.model.clone(),
        }
    }
}

impl<S: DocumentStore> State<S> {
    pub fn new(store: Arc<S>, model_uuid: Uuid, collections: Collections) -> Self {
        Self {
            engine: TransactionEngine::new(store),
            model: ModelContext::new(model_uuid, collections),
        }
    }

    pub fn from_config(store: Arc<S>, config: &Config) -> Self {
        Self::new(store, config.model_uuid, config.collections.clone())
    }

    pub fn model_uuid(&self) -> Uuid {
        self.model.model_uuid()
    }

    pub fn model(&self) -> &ModelContext {
        &self.model
    }

    pub fn engine(&self) -> &TransactionEngine<S> {
        &self.engine
    }

    /// Model-scoped document id for a natural key.
    pub fn doc_id(&self, local_id: &str) -> String {
        self.model.doc_id(local_id)
    }

    pub fn spaces(&self) -> EntityLifecycle<Space, S> {
        EntityLifecycle::new(self.engine.clone(), self.model.clone())
    }

    pub fn subnets(&self) -> EntityLifecycle<Subnet, S> {
        EntityLifecycle::new(self.engine.clone(), self.model.clone())
    }
}
