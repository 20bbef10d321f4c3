//! Tether Core - Document store boundary, transaction ops, and validation.
//!
//! This crate defines the shapes every other Tether crate speaks: documents,
//! conditional transaction ops, the `DocumentStore` trait, and the mapping
//! from logical entity kinds to physical collection names. It has no
//! dependencies on other Tether crates.

pub mod collections;
pub mod document;
pub mod error;
pub mod life;
pub mod store;
pub mod txn;
pub mod validation;

// Re-exports for convenience
pub use collections::{CollectionKind, Collections};
pub use document::{from_document, to_document, Document};
pub use error::{StoreError, ValidationError};
pub use life::Life;
pub use store::{DocumentStore, Query};
pub use txn::{Assertion, DocumentWrite, Mutation, Predicate, TransactionOp};
pub use validation::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use store::memory::InMemoryDocumentStore;
