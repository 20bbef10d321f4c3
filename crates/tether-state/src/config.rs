use std::path::PathBuf;

use uuid::Uuid;

use tether_core::{CollectionKind, Collections};

/// State layer configuration, loaded from environment variables.
///
/// `db_path` is where the redb file lives; open it with
/// `tether_db::open_store(&config.db_path)` and hand the store to
/// [`State::from_config`](crate::State::from_config).
#[derive(Debug, Clone)]
pub struct Config {
    pub model_uuid: Uuid,
    pub db_path: PathBuf,
    pub collections: Collections,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let model_uuid = lookup("TETHER_MODEL_UUID")
            .ok_or(ConfigError::Missing("TETHER_MODEL_UUID"))?
            .parse::<Uuid>()
            .map_err(|_| ConfigError::Invalid("TETHER_MODEL_UUID", "must be a valid UUID"))?;

        let db_path = lookup("TETHER_DB_PATH")
            .unwrap_or_else(|| "./tether.redb".to_string())
            .into();

        let collections = match lookup("TETHER_COLLECTIONS") {
            Some(s) if !s.is_empty() => Self::parse_collections(&s)?,
            _ => Collections::default(),
        };

        Ok(Config {
            model_uuid,
            db_path,
            collections,
        })
    }

    fn parse_collections(s: &str) -> Result<Collections, ConfigError> {
        let mut collections = Collections::default();
        for entry in s.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            // Expected format: "kind=name" e.g. "spaces=net_spaces"
            let (kind, name) = entry.split_once('=').ok_or(ConfigError::Invalid(
                "TETHER_COLLECTIONS",
                "expected format: kind=name (e.g. spaces=net_spaces)",
            ))?;
            let kind: CollectionKind = kind.trim().parse().map_err(|_| {
                ConfigError::Invalid(
                    "TETHER_COLLECTIONS",
                    "kind must be one of spaces, subnets, provider-ids",
                )
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid(
                    "TETHER_COLLECTIONS",
                    "collection name must not be empty",
                ));
            }

            collections = collections.with(kind, name);
        }
        Ok(collections)
    }

    /// Create a test configuration.
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Config {
            model_uuid: Uuid::nil(),
            db_path: PathBuf::from("/tmp/tether-test.redb"),
            collections: Collections::default(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} is not set", var),
            ConfigError::Invalid(var, msg) => write!(f, "{} is invalid: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tether_core::InMemoryDocumentStore;

    use crate::State;

    const UUID: &str = "6f1d3c52-8e0b-4c4e-9a55-1f2b7d0c9e11";

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("TETHER_MODEL_UUID", UUID)]).unwrap();

        assert_eq!(config.model_uuid.to_string(), UUID);
        assert_eq!(config.db_path, PathBuf::from("./tether.redb"));
        assert_eq!(config.collections, Collections::default());
    }

    #[test]
    fn test_model_uuid_required() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing("TETHER_MODEL_UUID")
        );
        assert!(matches!(
            load(&[("TETHER_MODEL_UUID", "not-a-uuid")]),
            Err(ConfigError::Invalid("TETHER_MODEL_UUID", _))
        ));
    }

    #[test]
    fn test_collection_overrides() {
        let config = load(&[
            ("TETHER_MODEL_UUID", UUID),
            ("TETHER_DB_PATH", "/var/lib/tether/state.redb"),
            ("TETHER_COLLECTIONS", "spaces=net_spaces, subnets=net_subnets"),
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/tether/state.redb"));
        assert_eq!(config.collections.name(CollectionKind::Spaces), "net_spaces");
        assert_eq!(config.collections.name(CollectionKind::Subnets), "net_subnets");
        assert_eq!(
            config.collections.name(CollectionKind::ProviderIds),
            "providerIDs"
        );
    }

    #[test]
    fn test_bad_collection_overrides() {
        for bad in ["spaces", "machines=m", "spaces="] {
            let err = load(&[("TETHER_MODEL_UUID", UUID), ("TETHER_COLLECTIONS", bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid("TETHER_COLLECTIONS", _)));
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::Missing("TETHER_MODEL_UUID").to_string(),
            "TETHER_MODEL_UUID is not set"
        );
        assert_eq!(
            ConfigError::Invalid("TETHER_MODEL_UUID", "must be a valid UUID").to_string(),
            "TETHER_MODEL_UUID is invalid: must be a valid UUID"
        );
    }

    #[test]
    fn test_state_from_config() {
        let config = Config::for_testing();
        let state = State::from_config(Arc::new(InMemoryDocumentStore::new()), &config);

        assert_eq!(state.model_uuid(), Uuid::nil());
        assert_eq!(state.doc_id("dmz"), format!("{}:dmz", Uuid::nil()));
    }
}
