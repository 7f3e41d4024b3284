//! Storage engine for sqlstore
//!
//! This crate turns record types into SQLite tables and runs CRUD and search
//! against them:
//! - introspect: field listing → column descriptors, key selection
//! - registry: canonical name → type descriptor, cycle-safe registration
//! - statements: per-type SQL generation
//! - store: the `Store` handle with open/close, batches and search
//!
//! The store is the only component that touches the connection.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod introspect;
pub mod registry;
pub mod statements;
pub mod store;

pub use introspect::{canonical_name, FieldDescriptor};
pub use registry::{Registry, TypeDescriptor};
pub use statements::{CrudStatementSet, Statement};
pub use store::{Store, StoreConfig, CONFIG_FILE_NAME};
