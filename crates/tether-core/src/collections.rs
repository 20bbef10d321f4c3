use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical kinds of document the state layer stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionKind {
    Spaces,
    Subnets,
    /// Model-wide uniqueness keys for provider ids.
    ProviderIds,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Spaces,
        CollectionKind::Subnets,
        CollectionKind::ProviderIds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Spaces => "spaces",
            CollectionKind::Subnets => "subnets",
            CollectionKind::ProviderIds => "provider-ids",
        }
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown collection kind {:?}", s))
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from logical collection kind to physical collection name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    spaces: String,
    subnets: String,
    provider_ids: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            spaces: "spaces".to_string(),
            subnets: "subnets".to_string(),
            provider_ids: "providerIDs".to_string(),
        }
    }
}

impl Collections {
    pub fn name(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Spaces => &self.spaces,
            CollectionKind::Subnets => &self.subnets,
            CollectionKind::ProviderIds => &self.provider_ids,
        }
    }

    /// Override the physical name used for one kind.
    pub fn with(mut self, kind: CollectionKind, name: impl Into<String>) -> Self {
        let name = name.into();
        match kind {
            CollectionKind::Spaces => self.spaces = name,
            CollectionKind::Subnets => self.subnets = name,
            CollectionKind::ProviderIds => self.provider_ids = name,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let collections = Collections::default();
        assert_eq!(collections.name(CollectionKind::Spaces), "spaces");
        assert_eq!(collections.name(CollectionKind::ProviderIds), "providerIDs");
    }

    #[test]
    fn test_override() {
        let collections = Collections::default().with(CollectionKind::Subnets, "net_subnets");
        assert_eq!(collections.name(CollectionKind::Subnets), "net_subnets");
        assert_eq!(collections.name(CollectionKind::Spaces), "spaces");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "provider-ids".parse::<CollectionKind>(),
            Ok(CollectionKind::ProviderIds)
        );
        assert!("machines".parse::<CollectionKind>().is_err());
    }
}
