use std::sync::Arc;

use tempfile::{tempdir, TempDir};
use uuid::Uuid;

use tether_core::Collections;
use tether_db::{init_database, RedbDocumentStore};
use tether_state::State;

/// Install a fmt subscriber that writes through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Create a state layer over a fresh redb file.
pub fn create_test_state() -> (TempDir, State<RedbDocumentStore>) {
    init_tracing();
    let dir = tempdir().unwrap();
    let db = init_database(dir.path().join("state.redb")).unwrap();
    let store = Arc::new(RedbDocumentStore::new(db));
    (dir, State::new(store, Uuid::new_v4(), Collections::default()))
}
