//! The record capability
//!
//! A type becomes storable by implementing [`Record`]. Its `describe` method
//! lists the declared fields in order, each paired with a mutable borrow of
//! the field's storage, which lets the engine read values for binding and
//! write scanned columns back without any runtime reflection.
//!
//! ```
//! use sqlstore_core::{Field, Record};
//!
//! #[derive(Default)]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     born: String,
//!     scratch: String,
//! }
//!
//! impl Record for Person {
//!     fn describe(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("ID", &mut self.id),
//!             Field::new("Name", &mut self.name),
//!             Field::new("DOB", &mut self.born).rename("DateOfBirth"),
//!             Field::new("Scratch", &mut self.scratch).skip(),
//!         ]
//!     }
//! }
//!
//! let mut p = Person::default();
//! let fields = p.describe();
//! assert_eq!(fields[2].column_name(), "DateOfBirth");
//! ```

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use crate::value::Value;

/// Column name sentinel that excludes a field from storage
pub const SKIP: &str = "-";

/// A storable record type
pub trait Record {
    /// Ordered declared fields with mutable access to their values
    fn describe(&mut self) -> Vec<Field<'_>>;

    /// Explicit table name, used verbatim instead of the derived one
    ///
    /// The derived name is the bare type name: module paths are dropped, so
    /// `billing::Account` and `auth::Account` both map to `Account` and would
    /// share one registry entry and one table. Types with clashing names must
    /// override this.
    fn table_name(&self) -> Option<&str> {
        None
    }

    /// Identity of the implementing type
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// On-disk representation of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// i32, i64, bool, Timestamp
    Integer,
    /// f32, f64
    Float,
    /// String
    Text,
    /// Vec<u8>
    Blob,
    /// Another record, stored as its primary key
    Nested,
}

impl StorageKind {
    /// SQLite column type
    pub fn sql_type(&self) -> &'static str {
        match self {
            StorageKind::Integer | StorageKind::Nested => "INTEGER",
            StorageKind::Float => "FLOAT",
            StorageKind::Text => "TEXT",
            StorageKind::Blob => "BLOB",
        }
    }
}

/// One declared field of a record
pub struct Field<'a> {
    name: &'static str,
    tag: Option<&'static str>,
    key: bool,
    exported: bool,
    value: FieldRef<'a>,
}

impl<'a> Field<'a> {
    /// A scalar field
    pub fn new(name: &'static str, value: impl Into<FieldRef<'a>>) -> Self {
        Field {
            name,
            tag: None,
            key: false,
            exported: true,
            value: value.into(),
        }
    }

    /// A field holding another record
    pub fn record(name: &'static str, value: &'a mut dyn Record) -> Self {
        Field::new(name, FieldRef::Record(value))
    }

    /// A field of a kind that cannot be stored; introspection skips it
    pub fn opaque(name: &'static str) -> Self {
        Field::new(name, FieldRef::Opaque)
    }

    /// Override the column name. `"-"` excludes the field.
    pub fn rename(mut self, column: &'static str) -> Self {
        self.tag = Some(column);
        self
    }

    /// Exclude the field from storage
    pub fn skip(self) -> Self {
        self.rename(SKIP)
    }

    /// Mark the field as the primary key
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Mark the field as not visible outside the type; introspection skips it
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Declared field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column name override, if any
    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    /// Resolved column name
    pub fn column_name(&self) -> &'static str {
        self.tag.unwrap_or(self.name)
    }

    /// True if the field is excluded with the `"-"` sentinel
    pub fn is_skipped(&self) -> bool {
        self.tag == Some(SKIP)
    }

    /// True if the field was explicitly marked as the key
    pub fn is_key(&self) -> bool {
        self.key
    }

    /// True unless the field was marked private
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Borrow the field's value
    pub fn value(&self) -> &FieldRef<'a> {
        &self.value
    }

    /// Mutably borrow the field's value
    pub fn value_mut(&mut self) -> &mut FieldRef<'a> {
        &mut self.value
    }

    /// Take the field's value, keeping the full borrow lifetime
    pub fn into_value(self) -> FieldRef<'a> {
        self.value
    }
}

/// Mutable borrow of a field's storage
pub enum FieldRef<'a> {
    /// 32-bit integer
    I32(&'a mut i32),
    /// 64-bit integer
    I64(&'a mut i64),
    /// 32-bit float
    F32(&'a mut f32),
    /// 64-bit float
    F64(&'a mut f64),
    /// UTF-8 string
    Text(&'a mut String),
    /// Boolean, stored as 0/1
    Bool(&'a mut bool),
    /// Byte sequence
    Bytes(&'a mut Vec<u8>),
    /// Timestamp, stored as microseconds
    Timestamp(&'a mut Timestamp),
    /// Nested record
    Record(&'a mut dyn Record),
    /// Unsupported kind
    Opaque,
}

impl<'a> FieldRef<'a> {
    /// Kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldRef::I32(_) => "i32",
            FieldRef::I64(_) => "i64",
            FieldRef::F32(_) => "f32",
            FieldRef::F64(_) => "f64",
            FieldRef::Text(_) => "text",
            FieldRef::Bool(_) => "bool",
            FieldRef::Bytes(_) => "bytes",
            FieldRef::Timestamp(_) => "timestamp",
            FieldRef::Record(_) => "record",
            FieldRef::Opaque => "opaque",
        }
    }

    /// Storage kind, or `None` for an unsupported field
    pub fn storage_kind(&self) -> Option<StorageKind> {
        match self {
            FieldRef::I32(_) | FieldRef::I64(_) | FieldRef::Bool(_) | FieldRef::Timestamp(_) => {
                Some(StorageKind::Integer)
            }
            FieldRef::F32(_) | FieldRef::F64(_) => Some(StorageKind::Float),
            FieldRef::Text(_) => Some(StorageKind::Text),
            FieldRef::Bytes(_) => Some(StorageKind::Blob),
            FieldRef::Record(_) => Some(StorageKind::Nested),
            FieldRef::Opaque => None,
        }
    }

    /// True if the field can hold a primary key
    pub fn is_key_candidate(&self) -> bool {
        matches!(self, FieldRef::I32(_) | FieldRef::I64(_))
    }

    /// Integer value of a key-capable field
    pub fn key_value(&self) -> Option<i64> {
        match self {
            FieldRef::I32(v) => Some(i64::from(**v)),
            FieldRef::I64(v) => Some(**v),
            _ => None,
        }
    }

    /// Write a key into a key-capable field. Returns false for other kinds.
    pub fn set_key_value(&mut self, key: i64) -> bool {
        match self {
            FieldRef::I32(v) => {
                // rowids beyond i32 read back as unsaved
                **v = i32::try_from(key).unwrap_or(0);
                true
            }
            FieldRef::I64(v) => {
                **v = key;
                true
            }
            _ => false,
        }
    }

    /// Current value of a scalar field; `None` for nested and opaque fields
    pub fn get(&self) -> Option<Value> {
        match self {
            FieldRef::I32(v) => Some(Value::from(**v)),
            FieldRef::I64(v) => Some(Value::from(**v)),
            FieldRef::F32(v) => Some(Value::from(**v)),
            FieldRef::F64(v) => Some(Value::from(**v)),
            FieldRef::Text(v) => Some(Value::Text((**v).clone())),
            FieldRef::Bool(v) => Some(Value::from(**v)),
            FieldRef::Bytes(v) => Some(Value::Blob((**v).clone())),
            FieldRef::Timestamp(v) => Some(Value::from(**v)),
            FieldRef::Record(_) | FieldRef::Opaque => None,
        }
    }

    /// Store a scanned column value into the field
    ///
    /// NULL resets the field to its zero value.
    pub fn set(&mut self, column: &str, value: Value) -> Result<()> {
        let mismatch = |expected: &'static str, actual: &Value| Error::Conversion {
            column: column.to_string(),
            expected,
            actual: actual.type_name(),
        };
        match (self, value) {
            (FieldRef::I32(v), Value::Int(i)) => {
                **v = i32::try_from(i).map_err(|_| mismatch("i32", &Value::Int(i)))?;
            }
            (FieldRef::I32(v), Value::Null) => **v = 0,
            (FieldRef::I64(v), Value::Int(i)) => **v = i,
            (FieldRef::I64(v), Value::Null) => **v = 0,
            (FieldRef::F32(v), Value::Float(f)) => **v = f as f32,
            (FieldRef::F32(v), Value::Int(i)) => **v = i as f32,
            (FieldRef::F32(v), Value::Null) => **v = 0.0,
            (FieldRef::F64(v), Value::Float(f)) => **v = f,
            (FieldRef::F64(v), Value::Int(i)) => **v = i as f64,
            (FieldRef::F64(v), Value::Null) => **v = 0.0,
            (FieldRef::Text(v), Value::Text(s)) => **v = s,
            (FieldRef::Text(v), Value::Null) => v.clear(),
            (FieldRef::Bool(v), Value::Int(i)) => **v = i != 0,
            (FieldRef::Bool(v), Value::Null) => **v = false,
            (FieldRef::Bytes(v), Value::Blob(b)) => **v = b,
            (FieldRef::Bytes(v), Value::Text(s)) => **v = s.into_bytes(),
            (FieldRef::Bytes(v), Value::Null) => v.clear(),
            (FieldRef::Timestamp(v), Value::Int(i)) => **v = Timestamp::from_micros(i),
            (FieldRef::Timestamp(v), Value::Null) => **v = Timestamp::EPOCH,
            (field, other) => return Err(mismatch(field.kind_name(), &other)),
        }
        Ok(())
    }
}

impl<'a> From<&'a mut i32> for FieldRef<'a> {
    fn from(v: &'a mut i32) -> Self {
        FieldRef::I32(v)
    }
}

impl<'a> From<&'a mut i64> for FieldRef<'a> {
    fn from(v: &'a mut i64) -> Self {
        FieldRef::I64(v)
    }
}

impl<'a> From<&'a mut f32> for FieldRef<'a> {
    fn from(v: &'a mut f32) -> Self {
        FieldRef::F32(v)
    }
}

impl<'a> From<&'a mut f64> for FieldRef<'a> {
    fn from(v: &'a mut f64) -> Self {
        FieldRef::F64(v)
    }
}

impl<'a> From<&'a mut String> for FieldRef<'a> {
    fn from(v: &'a mut String) -> Self {
        FieldRef::Text(v)
    }
}

impl<'a> From<&'a mut bool> for FieldRef<'a> {
    fn from(v: &'a mut bool) -> Self {
        FieldRef::Bool(v)
    }
}

impl<'a> From<&'a mut Vec<u8>> for FieldRef<'a> {
    fn from(v: &'a mut Vec<u8>) -> Self {
        FieldRef::Bytes(v)
    }
}

impl<'a> From<&'a mut Timestamp> for FieldRef<'a> {
    fn from(v: &'a mut Timestamp) -> Self {
        FieldRef::Timestamp(v)
    }
}
