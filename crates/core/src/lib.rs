//! Core types for sqlstore
//!
//! This crate defines the foundational types used throughout the system:
//! - Record: the capability a type implements to become storable
//! - Field / FieldRef: ordered field listing with mutable access to values
//! - StorageKind: fixed mapping from field kinds to column types
//! - Value: SQLite value exchanged with the engine
//! - Timestamp: integer-stored passthrough time type
//! - Filter / Sort: composable search predicates and ordering
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod record;
pub mod timestamp;
pub mod value;

pub use error::{Error, Result};
pub use filter::{quote_ident, Columns, Filter, Sort, WhereClause};
pub use record::{Field, FieldRef, Record, StorageKind, SKIP};
pub use timestamp::Timestamp;
pub use value::Value;
