use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tether_core::{
    Assertion, CollectionKind, DocumentStore, Life, Query, TransactionOp, Validator,
};

use crate::engine::AbortCheck;
use crate::error::StateError;
use crate::lifecycle::ManagedEntity;
use crate::model::ModelContext;
use crate::state::State;
use crate::subnet::Subnet;

/// A network space: a named set of subnets with common connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Space {
    #[serde(rename = "_id")]
    doc_id: String,
    model_uuid: Uuid,
    life: Life,
    name: String,
    is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider_id: Option<String>,
}

impl Space {
    /// The unique id other entities use to reference the space.
    pub fn id(&self) -> &str {
        &self.doc_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn life(&self) -> Life {
        self.life
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// The substrate's id for the space; `None` except on substrates that
    /// model spaces directly.
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }
}

impl std::fmt::Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl ManagedEntity for Space {
    const COLLECTION: CollectionKind = CollectionKind::Spaces;
    const KIND: &'static str = "space";

    fn doc_id(&self) -> &str {
        &self.doc_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn life(&self) -> Life {
        self.life
    }

    fn cleanup_ops(&self, model: &ModelContext) -> Vec<TransactionOp> {
        self.provider_id
            .iter()
            .map(|pid| model.provider_id_remove_op(Self::KIND, pid))
            .collect()
    }
}

impl<S: DocumentStore> State<S> {
    /// Create a space and move the named subnets into it, atomically.
    ///
    /// Subnets are referenced by CIDR and must already exist. They are only
    /// checked for existence; a subnet already in another space is moved.
    pub fn add_space(
        &self,
        name: &str,
        provider_id: Option<&str>,
        subnets: &[&str],
        is_public: bool,
    ) -> Result<Space, StateError> {
        Validator::validate_space_name(name)?;
        if let Some(pid) = provider_id {
            Validator::validate_provider_id(pid)?;
        }

        let model = self.model();
        let space = Space {
            doc_id: model.doc_id(name),
            model_uuid: model.model_uuid(),
            life: Life::Alive,
            name: name.to_string(),
            is_public,
            provider_id: provider_id.map(str::to_string),
        };

        let lifecycle = self.spaces();
        let mut ops = Vec::new();
        let mut checks = vec![lifecycle.already_exists_check(&space)];

        let subnets_c = model.collection(CollectionKind::Subnets).to_string();
        let mut refs = Vec::with_capacity(subnets.len());
        for cidr in subnets {
            let subnet_id = model.doc_id(cidr);
            ops.push(
                TransactionOp::new(subnets_c.as_str(), subnet_id.as_str())
                    .assert(Assertion::Exists)
                    .set_field("space-name", name),
            );
            refs.push((subnet_id, cidr.to_string()));
        }
        checks.push(AbortCheck::ReferencesExist {
            kind: Subnet::KIND,
            collection: subnets_c,
            refs,
        });

        if let Some(pid) = provider_id {
            ops.push(model.provider_id_insert_op(Space::KIND, pid));
            checks.push(AbortCheck::ProviderIdUnique {
                collection: model.collection(CollectionKind::ProviderIds).to_string(),
                key: model.provider_id_key(Space::KIND, pid),
                provider_id: pid.to_string(),
            });
        }

        lifecycle.insert(&space, ops, &checks)?;
        Ok(space)
    }

    /// Look up a space by name.
    pub fn space(&self, name: &str) -> Result<Space, StateError> {
        self.spaces().refresh(&self.doc_id(name))
    }

    pub fn all_spaces(&self) -> Result<Vec<Space>, StateError> {
        self.spaces().list()
    }

    /// All subnets currently associated with the named space.
    pub fn space_subnets(&self, name: &str) -> Result<Vec<Subnet>, StateError> {
        self.subnets().find(
            &Query::all()
                .field_eq("model-uuid", self.model_uuid().to_string())
                .field_eq("space-name", name),
        )
    }
}
