//! Type registry
//!
//! Maps canonical type names to their descriptors. Descriptors live in an
//! arena (`slots`); a name is bound to its slot before the type's nested
//! fields are registered, so a type graph that refers back to a type still
//! being registered terminates instead of recursing forever. A slot holding
//! `None` is a placeholder.
//!
//! A failed registration truncates the arena back to the failing type's slot,
//! dropping every type completed during the attempt. Those types could refer
//! back to the failed one through its placeholder. Tables already created
//! for them stay in the database and are reused by a later successful
//! registration.
//!
//! The registry is owned by a `Store` and lives exactly as long as it.

use crate::introspect::{canonical_name, check_columns, introspect, resolve_key, FieldDescriptor};
use crate::statements::CrudStatementSet;
use rusqlite::Connection;
use sqlstore_core::{Columns, Error, FieldRef, Record, Result};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Schema and statements of one registered type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Canonical type name, also the table name
    pub name: String,
    /// Index of the primary key within `fields`
    pub key: usize,
    /// Stored fields in declaration order
    pub fields: Vec<FieldDescriptor>,
    /// Generated statements
    pub statements: CrudStatementSet,
}

impl TypeDescriptor {
    /// The primary key field
    pub fn key_field(&self) -> &FieldDescriptor {
        &self.fields[self.key]
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl Columns for TypeDescriptor {
    fn resolve(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(column))
            .map(|f| f.name.as_str())
    }
}

/// Arena of type descriptors keyed by canonical name
#[derive(Debug, Default)]
pub struct Registry {
    slots: Vec<Option<TypeDescriptor>>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completely registered types
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True if no type is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptor of a completely registered type
    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.index
            .get(name)
            .and_then(|&slot| self.slots[slot].as_ref())
    }

    /// Descriptor of a registered type, or `UnregisteredType`
    pub fn get(&self, name: &str) -> Result<&TypeDescriptor> {
        self.lookup(name)
            .ok_or_else(|| Error::UnregisteredType(name.to_string()))
    }

    /// Descriptor for the type of `record`
    pub fn get_for(&self, record: &dyn Record) -> Result<&TypeDescriptor> {
        self.get(&canonical_name(record))
    }

    /// Drop every descriptor
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    /// Register the type of `record` and, recursively, every nested type
    ///
    /// Idempotent: a known type (registered or in progress) returns `Ok`
    /// immediately. On success the type's table exists in `conn`.
    pub fn register(&mut self, conn: &Connection, record: &mut dyn Record) -> Result<()> {
        let name = canonical_name(&*record);
        if self.index.contains_key(&name) {
            return Ok(());
        }

        let slot = self.slots.len();
        self.slots.push(None);
        self.index.insert(name.clone(), slot);

        match self.build(conn, &name, record) {
            Ok(descriptor) => {
                info!(
                    target: "sqlstore::registry",
                    table = %name,
                    columns = descriptor.fields.len(),
                    key = %descriptor.key_field().name,
                    "Type registered"
                );
                self.slots[slot] = Some(descriptor);
                Ok(())
            }
            Err(e) => {
                let dropped = self.slots.len() - slot - 1;
                warn!(
                    target: "sqlstore::registry",
                    table = %name,
                    dropped,
                    error = %e,
                    "Registration failed"
                );
                self.rollback(slot);
                Err(e)
            }
        }
    }

    /// Forget `slot` and every slot reserved after it
    fn rollback(&mut self, slot: usize) {
        self.slots.truncate(slot);
        self.index.retain(|_, &mut s| s < slot);
    }

    fn build(
        &mut self,
        conn: &Connection,
        name: &str,
        record: &mut dyn Record,
    ) -> Result<TypeDescriptor> {
        let fields = introspect(record)?;

        let mut described = record.describe();
        for field in fields.iter().filter(|f| f.nested_type.is_some()) {
            if let FieldRef::Record(nested) = described[field.slot].value_mut() {
                debug!(
                    target: "sqlstore::registry",
                    table = %name,
                    column = %field.name,
                    "Registering nested type"
                );
                self.register(conn, &mut **nested)?;
            }
        }
        drop(described);

        let key = resolve_key(name, &fields)?;
        check_columns(name, &fields)?;

        let statements = CrudStatementSet::build(name, &fields, key);
        debug!(target: "sqlstore::registry", sql = %statements.create, "Ensuring schema");
        conn.execute(&statements.create, [])?;

        Ok(TypeDescriptor {
            name: name.to_string(),
            key,
            fields,
            statements,
        })
    }
}
