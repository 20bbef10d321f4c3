use serde_json::json;
use uuid::Uuid;

use tether_core::{Assertion, CollectionKind, Collections, Document, TransactionOp};

/// The model a state layer operates on, plus where its documents live.
///
/// Entity ids are scoped to the model: `<model-uuid>:<natural key>`.
#[derive(Debug, Clone)]
pub struct ModelContext {
    model_uuid: Uuid,
    collections: Collections,
}

impl ModelContext {
    pub fn new(model_uuid: Uuid, collections: Collections) -> Self {
        Self {
            model_uuid,
            collections,
        }
    }

    pub fn model_uuid(&self) -> Uuid {
        self.model_uuid
    }

    pub fn collection(&self, kind: CollectionKind) -> &str {
        self.collections.name(kind)
    }

    pub fn doc_id(&self, local_id: &str) -> String {
        format!("{}:{}", self.model_uuid, local_id)
    }

    /// Id of the document reserving `provider_id` for entities of `kind`.
    pub fn provider_id_key(&self, kind: &str, provider_id: &str) -> String {
        format!("{}:{}:{}", self.model_uuid, kind, provider_id)
    }

    /// Reserve `provider_id`; aborts the transaction if it is already taken.
    pub fn provider_id_insert_op(&self, kind: &str, provider_id: &str) -> TransactionOp {
        let mut doc = Document::new();
        doc.insert("model-uuid".to_string(), json!(self.model_uuid));
        doc.insert("kind".to_string(), json!(kind));
        doc.insert("provider-id".to_string(), json!(provider_id));

        TransactionOp::new(
            self.collection(CollectionKind::ProviderIds),
            self.provider_id_key(kind, provider_id),
        )
        .assert(Assertion::Missing)
        .insert(doc)
    }

    pub fn provider_id_remove_op(&self, kind: &str, provider_id: &str) -> TransactionOp {
        TransactionOp::new(
            self.collection(CollectionKind::ProviderIds),
            self.provider_id_key(kind, provider_id),
        )
        .remove()
    }
}
