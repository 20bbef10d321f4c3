use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tether_core::{CollectionKind, DocumentStore, Life, TransactionOp, Validator};

use crate::engine::AbortCheck;
use crate::error::StateError;
use crate::lifecycle::ManagedEntity;
use crate::model::ModelContext;
use crate::state::State;

/// A subnet known to the model, keyed by its CIDR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Subnet {
    #[serde(rename = "_id")]
    doc_id: String,
    model_uuid: Uuid,
    life: Life,
    cidr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider_id: Option<String>,
    #[serde(default)]
    vlan_tag: u32,
    #[serde(default)]
    availability_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    space_name: Option<String>,
}

impl Subnet {
    pub fn id(&self) -> &str {
        &self.doc_id
    }

    pub fn cidr(&self) -> &str {
        &self.cidr
    }

    pub fn life(&self) -> Life {
        self.life
    }

    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    /// 802.1Q tag; zero when untagged.
    pub fn vlan_tag(&self) -> u32 {
        self.vlan_tag
    }

    pub fn availability_zone(&self) -> &str {
        &self.availability_zone
    }

    /// Name of the space the subnet currently belongs to, if any.
    pub fn space_name(&self) -> Option<&str> {
        self.space_name.as_deref()
    }
}

impl std::fmt::Display for Subnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cidr)
    }
}

impl ManagedEntity for Subnet {
    const COLLECTION: CollectionKind = CollectionKind::Subnets;
    const KIND: &'static str = "subnet";

    fn doc_id(&self) -> &str {
        &self.doc_id
    }

    fn name(&self) -> &str {
        &self.cidr
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

/// Attributes of a subnet to be added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetInfo {
    pub cidr: String,
    pub provider_id: Option<String>,
    pub vlan_tag: u32,
    pub availability_zone: String,
    pub space_name: Option<String>,
}

impl SubnetInfo {
    pub fn new(cidr: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            ..Default::default()
        }
    }

    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn with_vlan_tag(mut self, vlan_tag: u32) -> Self {
        self.vlan_tag = vlan_tag;
        self
    }

    pub fn with_availability_zone(mut self, zone: impl Into<String>) -> Self {
        self.availability_zone = zone.into();
        self
    }

    pub fn with_space(mut self, space_name: impl Into<String>) -> Self {
        self.space_name = Some(space_name.into());
        self
    }
}

impl<S: DocumentStore> State<S> {
    /// Add a subnet. The space it names, if any, is not required to exist.
    pub fn add_subnet(&self, info: SubnetInfo) -> Result<Subnet, StateError> {
        Validator::validate_cidr(&info.cidr)?;
        Validator::validate_vlan_tag(info.vlan_tag)?;
        if let Some(pid) = &info.provider_id {
            Validator::validate_provider_id(pid)?;
        }

        let model = self.model();
        let subnet = Subnet {
            doc_id: model.doc_id(&info.cidr),
            model_uuid: model.model_uuid(),
            life: Life::Alive,
            cidr: info.cidr,
            provider_id: info.provider_id,
            vlan_tag: info.vlan_tag,
            availability_zone: info.availability_zone,
            space_name: info.space_name,
        };

        let lifecycle = self.subnets();
        let mut ops = Vec::new();
        let mut checks = vec![lifecycle.already_exists_check(&subnet)];

        if let Some(pid) = &subnet.provider_id {
            ops.push(model.provider_id_insert_op(Subnet::KIND, pid));
            checks.push(AbortCheck::ProviderIdUnique {
                collection: model.collection(CollectionKind::ProviderIds).to_string(),
                key: model.provider_id_key(Subnet::KIND, pid),
                provider_id: pid.clone(),
            });
        }

        lifecycle.insert(&subnet, ops, &checks)?;
        Ok(subnet)
    }

    /// Look up a subnet by CIDR.
    pub fn subnet(&self, cidr: &str) -> Result<Subnet, StateError> {
        self.subnets().refresh(&self.doc_id(cidr))
    }

    pub fn all_subnets(&self) -> Result<Vec<Subnet>, StateError> {
        self.subnets().list()
    }
}
