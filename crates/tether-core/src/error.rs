use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// At least one assertion in the transaction did not hold; nothing was applied.
    #[error("transaction aborted")]
    Aborted,

    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("document codec error: {0}")]
    Codec(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid space name {0:?}")]
    InvalidSpaceName(String),

    #[error("invalid CIDR {0:?}: {1}")]
    InvalidCidr(String, &'static str),

    #[error("invalid provider id {0:?}")]
    InvalidProviderId(String),

    #[error("invalid VLAN tag {0}: must be between 0 and 4094")]
    InvalidVlanTag(u32),
}
