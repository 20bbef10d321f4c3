mod common;

use tether_core::Life;
use tether_state::{StateError, SubnetInfo};

use common::create_test_state;

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_space_with_subnets_persists() {
    let (_dir, state) = create_test_state();
    state
        .add_subnet(SubnetInfo::new("10.0.0.0/24").with_provider_id("sn-1"))
        .unwrap();
    state
        .add_subnet(SubnetInfo::new("10.0.1.0/24").with_availability_zone("zone-b"))
        .unwrap();

    let space = state
        .add_space("db", Some("sp-1"), &["10.0.0.0/24", "10.0.1.0/24"], false)
        .unwrap();

    assert_eq!(state.space("db").unwrap(), space);
    let subnets = state.space_subnets("db").unwrap();
    assert_eq!(subnets.len(), 2);
    assert!(subnets.iter().all(|s| s.space_name() == Some("db")));
    assert_eq!(subnets[1].availability_zone(), "zone-b");
}

#[test]
fn test_missing_subnet_leaves_no_trace() {
    let (_dir, state) = create_test_state();
    state.add_subnet(SubnetInfo::new("10.0.0.0/24")).unwrap();

    let err = state
        .add_space("db", Some("sp-1"), &["10.0.0.0/24", "10.0.5.0/24"], false)
        .unwrap_err();
    assert_eq!(
        err,
        StateError::ReferenceNotFound {
            kind: "subnet",
            id: "10.0.5.0/24".to_string()
        }
    );

    assert!(state.space("db").unwrap_err().is_not_found());
    assert_eq!(state.subnet("10.0.0.0/24").unwrap().space_name(), None);

    // The provider id was not reserved either.
    state.add_space("web", Some("sp-1"), &[], false).unwrap();
}

#[test]
fn test_duplicate_space_already_exists() {
    let (_dir, state) = create_test_state();
    state.add_space("dmz", None, &[], true).unwrap();

    let err = state.add_space("dmz", None, &["10.9.9.0/24"], true).unwrap_err();
    assert_eq!(
        err,
        StateError::AlreadyExists {
            kind: "space",
            id: "dmz".to_string()
        }
    );
}

// ============================================================================
// Life cycle
// ============================================================================

#[test]
fn test_full_life_cycle() {
    let (_dir, state) = create_test_state();
    let space = state.add_space("dmz", Some("sp-1"), &[], true).unwrap();
    let spaces = state.spaces();

    assert_eq!(spaces.refresh(space.id()).unwrap().life(), Life::Alive);

    spaces.ensure_dying(space.id()).unwrap();
    assert_eq!(spaces.refresh(space.id()).unwrap().life(), Life::Dying);

    spaces.ensure_dead(space.id()).unwrap();
    spaces.ensure_dead(space.id()).unwrap();
    assert_eq!(spaces.refresh(space.id()).unwrap().life(), Life::Dead);

    spaces.remove(space.id()).unwrap();
    assert_eq!(
        spaces.refresh(space.id()).unwrap_err(),
        StateError::NotFound {
            kind: "space",
            id: "dmz".to_string()
        }
    );
    assert!(state.all_spaces().unwrap().is_empty());

    // Name and provider id are both free again.
    state.add_space("dmz", Some("sp-1"), &[], true).unwrap();
}

#[test]
fn test_remove_alive_subnet_rejected() {
    let (_dir, state) = create_test_state();
    let subnet = state.add_subnet(SubnetInfo::new("10.0.0.0/24")).unwrap();

    assert_eq!(
        state.subnets().remove(subnet.id()),
        Err(StateError::NotDeadOrNotFound {
            kind: "subnet",
            id: "10.0.0.0/24".to_string()
        })
    );
    assert_eq!(state.subnet("10.0.0.0/24").unwrap().life(), Life::Alive);
}

#[test]
fn test_life_never_moves_backwards() {
    let (_dir, state) = create_test_state();
    let subnet = state.add_subnet(SubnetInfo::new("10.0.0.0/24")).unwrap();
    let subnets = state.subnets();

    subnets.ensure_dead(subnet.id()).unwrap();
    subnets.ensure_dying(subnet.id()).unwrap();

    assert_eq!(subnets.refresh(subnet.id()).unwrap().life(), Life::Dead);
}

#[test]
fn test_state_survives_reopen() {
    use std::sync::Arc;
    use tether_core::Collections;
    use tether_db::{init_database, RedbDocumentStore};
    use tether_state::State;

    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.redb");
    let model_uuid = uuid::Uuid::new_v4();

    {
        let store = Arc::new(RedbDocumentStore::new(init_database(&path).unwrap()));
        let state = State::new(store, model_uuid, Collections::default());
        state.add_space("dmz", None, &[], true).unwrap();
    }

    let store = Arc::new(RedbDocumentStore::new(init_database(&path).unwrap()));
    let state = State::new(store, model_uuid, Collections::default());
    assert!(state.space("dmz").unwrap().is_public());
}

#[test]
fn test_state_opened_from_config() {
    use tether_core::{CollectionKind, DocumentStore};
    use tether_db::open_store;
    use tether_state::{Config, State};

    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("configured.redb");
    let db_path_str = db_path.to_string_lossy().to_string();
    let model_uuid = uuid::Uuid::new_v4().to_string();

    let config = Config::from_lookup(|var| match var {
        "TETHER_MODEL_UUID" => Some(model_uuid.clone()),
        "TETHER_DB_PATH" => Some(db_path_str.clone()),
        "TETHER_COLLECTIONS" => Some("spaces=net_spaces".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.db_path, db_path);

    let store = open_store(&config.db_path).unwrap();
    let state = State::from_config(store.clone(), &config);
    state.add_space("dmz", None, &[], true).unwrap();

    assert!(store
        .find_by_id(
            config.collections.name(CollectionKind::Spaces),
            &state.doc_id("dmz")
        )
        .is_ok());
    assert!(db_path.exists());
}
