//! Field introspection
//!
//! Turns a record's `describe()` listing into column descriptors. Pure: no
//! registry state is read or written here.
//!
//! Rules:
//! - private fields and fields tagged `"-"` are skipped, including from key selection
//! - fields of unsupported kinds are skipped silently
//! - the key is chosen by priority: explicit annotation, then a column named
//!   `id` (any case), then the first integer field
//! - column names must be unique, ignoring ASCII case

use sqlstore_core::{Error, FieldRef, Record, Result, StorageKind};
use std::collections::HashSet;
use tracing::{trace, warn};

/// Resolved description of one stored field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Column name after annotation overrides
    pub name: String,
    /// Column storage kind
    pub kind: StorageKind,
    /// True iff the field holds an integer scalar
    pub is_key_candidate: bool,
    /// Canonical name of the referenced record type, for nested fields
    pub nested_type: Option<String>,
    /// Position of the field in the record's `describe()` listing
    pub slot: usize,
    /// True if the field carries an explicit key annotation
    pub explicit_key: bool,
}

/// Canonical registry name of a record's type
///
/// An explicit `table_name()` wins verbatim. Otherwise the Rust type name is
/// used with reference/pointer markers and the module path stripped; generic
/// arguments are kept as written.
pub fn canonical_name(record: &dyn Record) -> String {
    match record.table_name() {
        Some(name) => name.to_string(),
        None => derive_name(record.type_name()),
    }
}

fn derive_name(raw: &str) -> String {
    let mut name = raw.trim();
    loop {
        let stripped = ["&mut ", "&", "*const ", "*mut "]
            .iter()
            .find_map(|marker| name.strip_prefix(marker));
        match stripped {
            Some(rest) => name = rest.trim_start(),
            None => break,
        }
    }
    let (head, generics) = match name.find('<') {
        Some(pos) => name.split_at(pos),
        None => (name, ""),
    };
    let short = head.rsplit("::").next().unwrap_or(head);
    format!("{}{}", short, generics)
}

/// Describe the stored fields of `record`, in declaration order
pub fn introspect(record: &mut dyn Record) -> Result<Vec<FieldDescriptor>> {
    let table = canonical_name(&*record);
    let fields = record.describe();
    if fields.is_empty() {
        return Err(Error::NotARecord(table));
    }

    let mut out = Vec::with_capacity(fields.len());
    for (slot, field) in fields.iter().enumerate() {
        if !field.is_exported() || field.is_skipped() {
            trace!(target: "sqlstore::registry", table = %table, field = field.name(), "Field excluded");
            continue;
        }
        let value = field.value();
        let Some(kind) = value.storage_kind() else {
            trace!(target: "sqlstore::registry", table = %table, field = field.name(), "Unsupported field kind skipped");
            continue;
        };
        let nested_type = match value {
            FieldRef::Record(nested) => Some(canonical_name(&**nested)),
            _ => None,
        };
        out.push(FieldDescriptor {
            name: field.column_name().to_string(),
            kind,
            is_key_candidate: value.is_key_candidate(),
            nested_type,
            slot,
            explicit_key: field.is_key(),
        });
    }
    Ok(out)
}

/// Pick the primary key among `fields`; returns its index in `fields`
pub fn resolve_key(table: &str, fields: &[FieldDescriptor]) -> Result<usize> {
    let mut key = None;
    let mut priority = 0;
    for (index, field) in fields.iter().enumerate() {
        if !field.is_key_candidate {
            if field.explicit_key {
                warn!(
                    target: "sqlstore::registry",
                    table = %table,
                    column = %field.name,
                    "Key annotation on a non-integer field ignored"
                );
            }
            continue;
        }
        let candidate = if field.explicit_key {
            3
        } else if field.name.eq_ignore_ascii_case("id") {
            2
        } else {
            1
        };
        if candidate > priority {
            priority = candidate;
            key = Some(index);
        }
    }
    key.ok_or_else(|| Error::NoPrimaryKey(table.to_string()))
}

/// Fail on two columns with the same name, ignoring ASCII case
pub fn check_columns(table: &str, fields: &[FieldDescriptor]) -> Result<()> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.name.to_ascii_lowercase()) {
            return Err(Error::DuplicateColumn {
                table: table.to_string(),
                column: field.name.clone(),
            });
        }
    }
    Ok(())
}
