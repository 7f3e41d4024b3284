//! Store struct and open/close logic
//!
//! A `Store` exclusively owns one SQLite connection and one type registry.
//! Both sit behind a single `parking_lot::Mutex`: every public operation
//! holds it for its full duration, so schema creation and statement
//! execution never interleave. Nested registration and nested reads recurse
//! on the already-locked state and never take the lock again.
//!
//! ## Lifecycle
//!
//! `open` → any number of operations → `close`. Closing drops the connection
//! (and with it every prepared statement) and the registry. A closed store
//! stays closed: every later call returns [`Error::Closed`].
//!
//! ## Batches
//!
//! `set`, `insert`, `update`, `get`, `delete`, `get_page` and `search` take a
//! slice of records that must all be of the first record's type. The first
//! mismatch stops the batch with [`Error::TypeMismatch`]; records before it
//! have been processed.

pub mod config;
mod executor;

pub use config::{StoreConfig, CONFIG_FILE_NAME};

use crate::introspect::canonical_name;
use crate::registry::{Registry, TypeDescriptor};
use executor::Executor;
use parking_lot::Mutex;
use rusqlite::Connection;
use sqlstore_core::{Error, Filter, Record, Result, Sort};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

struct StoreInner {
    conn: Option<Connection>,
    registry: Registry,
}

impl StoreInner {
    fn executor(&self) -> Result<Executor<'_>> {
        let conn = self.conn.as_ref().ok_or(Error::Closed)?;
        Ok(Executor::new(conn, &self.registry))
    }
}

/// Runtime object-relational store over SQLite
///
/// # Example
///
/// ```
/// use sqlstore_engine::Store;
/// use sqlstore_core::{Field, Filter, Record};
///
/// #[derive(Default)]
/// struct Note {
///     id: i64,
///     text: String,
/// }
///
/// impl Record for Note {
///     fn describe(&mut self) -> Vec<Field<'_>> {
///         vec![Field::new("id", &mut self.id), Field::new("text", &mut self.text)]
///     }
/// }
///
/// let store = Store::open_in_memory()?;
/// store.register_type::<Note>()?;
///
/// let mut note = Note { id: 0, text: "hello".into() };
/// store.set(&mut [&mut note])?;
/// assert_eq!(note.id, 1);
///
/// let mut found = vec![Note::default()];
/// let mut refs: Vec<&mut dyn Record> = found.iter_mut().map(|n| n as &mut dyn Record).collect();
/// let n = store.search(&mut refs, 0, &[Filter::like("text", "hel%")])?;
/// assert_eq!(n, 1);
/// # Ok::<(), sqlstore_core::Error>(())
/// ```
pub struct Store {
    inner: Mutex<StoreInner>,
}

impl Store {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        info!(target: "sqlstore::store", path = ?path, "Opening store");
        let conn = Connection::open(path)?;
        Self::from_connection(conn, config)
    }

    /// Open a private in-memory database with the default configuration
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, StoreConfig::default())
    }

    /// Take ownership of an existing connection and configure it
    pub fn from_connection(conn: Connection, config: StoreConfig) -> Result<Self> {
        let journal_mode = config.journal_mode_pragma()?;
        conn.set_prepared_statement_cache_capacity(config.statement_cache_capacity);
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        let applied: String =
            conn.pragma_update_and_check(None, "journal_mode", journal_mode, |row| row.get(0))?;
        debug!(
            target: "sqlstore::store",
            journal_mode = %applied,
            statement_cache_capacity = config.statement_cache_capacity,
            "Connection configured"
        );
        Ok(Store {
            inner: Mutex::new(StoreInner {
                conn: Some(conn),
                registry: Registry::new(),
            }),
        })
    }

    // ========== Registration ==========

    /// Register the type of `record` (and every nested type)
    ///
    /// Idempotent. Creates the type's table if it does not exist.
    pub fn register(&self, record: &mut dyn Record) -> Result<()> {
        let mut inner = self.inner.lock();
        let StoreInner { conn, registry } = &mut *inner;
        let conn = conn.as_ref().ok_or(Error::Closed)?;
        registry.register(conn, record)
    }

    /// Register `T` using its default value as the template
    pub fn register_type<T: Record + Default>(&self) -> Result<()> {
        self.register(&mut T::default())
    }

    /// True if the type of `record` is registered
    pub fn is_registered(&self, record: &dyn Record) -> bool {
        self.inner
            .lock()
            .registry
            .lookup(&canonical_name(record))
            .is_some()
    }

    /// Copy of the descriptor registered under `name`
    pub fn descriptor(&self, name: &str) -> Option<TypeDescriptor> {
        self.inner.lock().registry.lookup(name).cloned()
    }

    // ========== CRUD ==========

    /// Insert or update each record
    ///
    /// A zero key inserts and writes the new key back. A non-zero key
    /// updates in place, falling back to an insert when no row has that key.
    pub fn set(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        self.inner.lock().executor()?.set(records)
    }

    /// Insert each record as a new row and write the new key back
    pub fn insert(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        self.inner.lock().executor()?.insert(records)
    }

    /// Update each record by key; returns how many rows were found
    pub fn update(&self, records: &mut [&mut dyn Record]) -> Result<usize> {
        self.inner.lock().executor()?.update(records)
    }

    /// Load each record by its key
    ///
    /// A zero key leaves the record untouched; a key with no row is reset to
    /// zero.
    pub fn get(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        self.inner.lock().executor()?.get(records)
    }

    /// Delete each record's row by key
    pub fn delete(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        self.inner.lock().executor()?.delete(records)
    }

    /// Fill `records` with consecutive rows in ascending key order
    ///
    /// Returns the number filled; fewer than `records.len()` means the end
    /// of the table was reached.
    pub fn get_page(&self, records: &mut [&mut dyn Record], offset: usize) -> Result<usize> {
        self.inner.lock().executor()?.get_page(records, offset)
    }

    /// Total rows stored for the type of `record`
    pub fn count(&self, record: &dyn Record) -> Result<i64> {
        self.inner.lock().executor()?.count(record)
    }

    // ========== Search ==========

    /// Fill `records` with rows matching every filter, ascending by key
    pub fn search(
        &self,
        records: &mut [&mut dyn Record],
        offset: usize,
        filters: &[Filter],
    ) -> Result<usize> {
        self.inner
            .lock()
            .executor()?
            .search(records, offset, None, filters)
    }

    /// Like [`Store::search`], with an explicit ordering
    pub fn search_sorted(
        &self,
        records: &mut [&mut dyn Record],
        offset: usize,
        sort: &Sort,
        filters: &[Filter],
    ) -> Result<usize> {
        self.inner
            .lock()
            .executor()?
            .search(records, offset, Some(sort), filters)
    }

    /// Number of rows matching every filter
    pub fn search_count(&self, record: &dyn Record, filters: &[Filter]) -> Result<i64> {
        self.inner.lock().executor()?.search_count(record, filters)
    }

    // ========== Lifecycle ==========

    /// Close the connection and drop every descriptor
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let conn = inner.conn.take().ok_or(Error::Closed)?;
        let types = inner.registry.len();
        inner.registry.clear();
        info!(target: "sqlstore::store", types, "Closing store");
        conn.close().map_err(|(_, e)| Error::from(e))
    }

    /// True once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.lock().conn.is_none()
    }
}
