//! Tether State - Transactional entity life cycles over a document store.
//!
//! Every change is a sequence of conditional ops applied atomically through a
//! [`TransactionEngine`]. When a transaction aborts, the engine walks an
//! ordered table of [`AbortCheck`]s to tell the caller what went wrong. The
//! engine never retries.
//!
//! Entities are plain values. [`EntityLifecycle`] drives any
//! [`ManagedEntity`] through Alive, Dying and Dead, and removes it once Dead.
//! [`Space`] and [`Subnet`] are the concrete kinds, reached through [`State`].

pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod space;
pub mod state;
pub mod subnet;

// Re-exports for convenience
pub use config::{Config, ConfigError};
pub use engine::{AbortCheck, TransactionEngine};
pub use error::StateError;
pub use lifecycle::{EntityLifecycle, ManagedEntity};
pub use model::ModelContext;
pub use space::Space;
pub use state::State;
pub use subnet::{Subnet, SubnetInfo};
