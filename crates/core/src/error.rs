//! Error types for sqlstore
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! # Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Registration | `NotARecord`, `NoPrimaryKey`, `DuplicateColumn` |
//! | Operation | `UnregisteredType`, `TypeMismatch`, `UnknownColumn`, `WrongKeyKind`, `NoFilterParams`, `Closed`, `Conversion` |
//! | Execution | `Storage` (verbatim from SQLite) |
//! | System | `Io`, `Config` |

use std::io;
use thiserror::Error;

/// Result type alias for sqlstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sqlstore
#[derive(Debug, Error)]
pub enum Error {
    // ==================== Registration ====================
    /// The value handed to registration describes no fields at all
    #[error("not a record type: {0}")]
    NotARecord(String),

    /// No integer-compatible field could serve as the primary key
    #[error("no eligible primary key for type {0}")]
    NoPrimaryKey(String),

    /// Two fields resolve to the same column name (case-insensitive)
    #[error("duplicate column {column} in type {table}")]
    DuplicateColumn {
        /// Table being registered
        table: String,
        /// Offending column name
        column: String,
    },

    // ==================== Operation ====================
    /// Operation on a type that was never registered
    #[error("unregistered type: {0}")]
    UnregisteredType(String),

    /// A batch mixes record types
    #[error("type mismatch at position {index}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Canonical name of the first record in the batch
        expected: String,
        /// Canonical name of the offending record
        found: String,
        /// Position of the offending record; everything before it was processed
        index: usize,
    },

    /// Filter or sort references a column the type does not have
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// The key field does not hold an integer
    #[error("primary key {column} of {table} is not an integer field")]
    WrongKeyKind {
        /// Table name
        table: String,
        /// Key column
        column: String,
    },

    /// A composite filter was given no children
    #[error("no search parameters given")]
    NoFilterParams,

    /// A stored column value cannot be placed into its field
    #[error("cannot convert column {column}: expected {expected}, got {actual}")]
    Conversion {
        /// Column being scanned
        column: String,
        /// Field kind
        expected: &'static str,
        /// Stored value kind
        actual: &'static str,
    },

    /// The store was closed
    #[error("database already closed")]
    Closed,

    // ==================== Execution ====================
    /// Failure surfaced by SQLite
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    // ==================== System ====================
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `Config` error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// True if this error came from the storage engine
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
