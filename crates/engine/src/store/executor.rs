//! CRUD execution against a locked connection
//!
//! An `Executor` borrows the connection and registry of a locked store for
//! the duration of one public call. It never registers types and never
//! touches the lock.
//!
//! Reads are two-phase: a row fills the scalar fields of its record and only
//! the key of each nested record; nested records are queued and fetched
//! breadth-first once every top-level row of the call has been read. A
//! referent whose row was already read during the call gets its key but is
//! not queued again, so reads over cyclic data terminate.

use crate::introspect::canonical_name;
use crate::registry::{Registry, TypeDescriptor};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use sqlstore_core::{
    quote_ident, Error, Field, FieldRef, Filter, Record, Result, Sort, Value, WhereClause,
};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Nested records still to be read, plus the rows already read this call
struct Pending<'r> {
    queue: VecDeque<&'r mut dyn Record>,
    visited: HashSet<(String, i64)>,
}

impl<'r> Pending<'r> {
    fn new() -> Self {
        Pending {
            queue: VecDeque::new(),
            visited: HashSet::new(),
        }
    }
}

pub(crate) struct Executor<'s> {
    conn: &'s Connection,
    registry: &'s Registry,
}

impl<'s> Executor<'s> {
    pub(crate) fn new(conn: &'s Connection, registry: &'s Registry) -> Self {
        Executor { conn, registry }
    }

    fn descriptor(&self, record: &dyn Record) -> Result<&'s TypeDescriptor> {
        let registry: &'s Registry = self.registry;
        registry.get_for(record)
    }

    // ========== Batches ==========

    fn for_each(
        &self,
        records: &mut [&mut dyn Record],
        mut op: impl FnMut(&Self, &mut dyn Record) -> Result<()>,
    ) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let expected = canonical_name(&**first);
        for (index, record) in records.iter_mut().enumerate() {
            check_type(&expected, &**record, index)?;
            op(self, &mut **record)?;
        }
        Ok(())
    }

    pub(crate) fn insert(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        self.for_each(records, |exec, record| exec.insert_one(record).map(|_| ()))
    }

    pub(crate) fn update(&self, records: &mut [&mut dyn Record]) -> Result<usize> {
        let mut updated = 0;
        self.for_each(records, |exec, record| {
            if exec.update_one(record)? {
                updated += 1;
            }
            Ok(())
        })?;
        Ok(updated)
    }

    pub(crate) fn set(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        self.for_each(records, |exec, record| exec.set_one(record))
    }

    pub(crate) fn delete(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        self.for_each(records, |exec, record| exec.delete_one(record))
    }

    pub(crate) fn get(&self, records: &mut [&mut dyn Record]) -> Result<()> {
        let mut pending = Pending::new();
        let outcome = self.fetch_batch(records, &mut pending);
        let drained = self.drain(&mut pending);
        outcome.and(drained)
    }

    pub(crate) fn get_page(&self, records: &mut [&mut dyn Record], offset: usize) -> Result<usize> {
        let Some(first) = records.first() else {
            return Ok(0);
        };
        let desc = self.descriptor(&**first)?;
        let params = vec![sql_int(records.len()), sql_int(offset)];
        let keys = self.query_keys(&desc.statements.page.sql, params)?;
        self.fill_all(desc, records, &keys)
    }

    pub(crate) fn count(&self, record: &dyn Record) -> Result<i64> {
        let desc = self.descriptor(record)?;
        let mut stmt = self.conn.prepare_cached(&desc.statements.count.sql)?;
        let count = stmt.query_row([], |row| row.get(0))?;
        Ok(count)
    }

    pub(crate) fn search(
        &self,
        records: &mut [&mut dyn Record],
        offset: usize,
        sort: Option<&Sort>,
        filters: &[Filter],
    ) -> Result<usize> {
        let Some(first) = records.first() else {
            return Ok(0);
        };
        let desc = self.descriptor(&**first)?;
        let (where_sql, mut params) = where_parts(WhereClause::from_filters(filters, desc)?);
        let key = &desc.key_field().name;
        let order = match sort {
            Some(sort) => sort.render(desc, key)?,
            None => format!("{} ASC", quote_ident(key)),
        };
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} LIMIT ? OFFSET ?;",
            quote_ident(key),
            quote_ident(&desc.name),
            where_sql,
            order
        );
        params.push(sql_int(records.len()));
        params.push(sql_int(offset));
        let keys = self.query_keys(&sql, params)?;
        self.fill_all(desc, records, &keys)
    }

    pub(crate) fn search_count(&self, record: &dyn Record, filters: &[Filter]) -> Result<i64> {
        let desc = self.descriptor(record)?;
        let (where_sql, params) = where_parts(WhereClause::from_filters(filters, desc)?);
        let sql = format!(
            "SELECT COUNT(1) FROM {}{};",
            quote_ident(&desc.name),
            where_sql
        );
        debug!(target: "sqlstore::store", sql = %sql, "Search count");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let count = stmt.query_row(params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count)
    }

    // ========== Single records ==========

    fn insert_one(&self, record: &mut dyn Record) -> Result<i64> {
        let desc = self.descriptor(&*record)?;
        let insert = &desc.statements.insert;
        let mut fields = record.describe();
        let params = self.bind(desc, &mut fields, &insert.binds)?;
        debug!(target: "sqlstore::store", table = %desc.name, "Insert");
        let mut stmt = self.conn.prepare_cached(&insert.sql)?;
        stmt.execute(params_from_iter(params.iter()))?;
        let id = self.conn.last_insert_rowid();
        write_key(desc, &mut fields, id)?;
        Ok(id)
    }

    /// Returns false when no row has the record's key
    fn update_one(&self, record: &mut dyn Record) -> Result<bool> {
        let desc = self.descriptor(&*record)?;
        let update = &desc.statements.update;
        let mut fields = record.describe();
        let params = self.bind(desc, &mut fields, &update.binds)?;
        debug!(target: "sqlstore::store", table = %desc.name, "Update");
        let mut stmt = self.conn.prepare_cached(&update.sql)?;
        let changed = stmt.execute(params_from_iter(params.iter()))?;
        Ok(changed > 0)
    }

    fn set_one(&self, record: &mut dyn Record) -> Result<()> {
        let desc = self.descriptor(&*record)?;
        let key = read_key(desc, &record.describe())?;
        if key == 0 || !self.update_one(record)? {
            self.insert_one(record)?;
        }
        Ok(())
    }

    fn delete_one(&self, record: &mut dyn Record) -> Result<()> {
        let desc = self.descriptor(&*record)?;
        let delete = &desc.statements.delete;
        let mut fields = record.describe();
        let params = self.bind(desc, &mut fields, &delete.binds)?;
        debug!(target: "sqlstore::store", table = %desc.name, "Delete");
        let mut stmt = self.conn.prepare_cached(&delete.sql)?;
        stmt.execute(params_from_iter(params.iter()))?;
        Ok(())
    }

    /// Key of a nested record, inserting it first if it has none yet
    fn ensure_saved(&self, record: &mut dyn Record) -> Result<i64> {
        let desc = self.descriptor(&*record)?;
        let key = read_key(desc, &record.describe())?;
        if key != 0 {
            return Ok(key);
        }
        self.insert_one(record)
    }

    fn set_key_of(&self, record: &mut dyn Record, key: i64) -> Result<()> {
        let desc = self.descriptor(&*record)?;
        write_key(desc, &mut record.describe(), key)
    }

    fn bind(
        &self,
        desc: &TypeDescriptor,
        fields: &mut [Field<'_>],
        binds: &[usize],
    ) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(binds.len());
        for &index in binds {
            let slot = desc.fields[index].slot;
            let value = match fields[slot].value_mut() {
                FieldRef::Record(nested) => Value::Int(self.ensure_saved(&mut **nested)?),
                other => other.get().unwrap_or(Value::Null),
            };
            values.push(value);
        }
        Ok(values)
    }

    // ========== Reads ==========

    fn fetch_batch<'r>(
        &self,
        records: &'r mut [&mut dyn Record],
        pending: &mut Pending<'r>,
    ) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let expected = canonical_name(&**first);
        for (index, record) in records.iter_mut().enumerate() {
            check_type(&expected, &**record, index)?;
            self.fetch(&mut **record, pending)?;
        }
        Ok(())
    }

    fn fill_all(
        &self,
        desc: &TypeDescriptor,
        records: &mut [&mut dyn Record],
        keys: &[i64],
    ) -> Result<usize> {
        let mut pending = Pending::new();
        let outcome = self.fill(desc, records, keys, &mut pending);
        let drained = self.drain(&mut pending);
        let filled = outcome?;
        drained?;
        Ok(filled)
    }

    fn fill<'r>(
        &self,
        desc: &TypeDescriptor,
        records: &'r mut [&mut dyn Record],
        keys: &[i64],
        pending: &mut Pending<'r>,
    ) -> Result<usize> {
        let mut filled = 0;
        for (index, (record, &key)) in records.iter_mut().zip(keys).enumerate() {
            check_type(&desc.name, &**record, index)?;
            self.set_key_of(&mut **record, key)?;
            self.fetch(&mut **record, pending)?;
            filled += 1;
        }
        Ok(filled)
    }

    fn drain<'r>(&self, pending: &mut Pending<'r>) -> Result<()> {
        while let Some(record) = pending.queue.pop_front() {
            self.fetch(record, pending)?;
        }
        Ok(())
    }

    /// Read one row into `record`; queue its nested records on `pending`
    ///
    /// A zero key is a no-op. A missing row resets the key to zero. Nested
    /// records whose row was already read this call receive their key only.
    fn fetch<'r>(&self, record: &'r mut dyn Record, pending: &mut Pending<'r>) -> Result<()> {
        let desc = self.descriptor(&*record)?;
        let get = &desc.statements.get;
        let mut fields = record.describe();
        let key = read_key(desc, &fields)?;
        if key == 0 {
            return Ok(());
        }

        pending.visited.insert((desc.name.clone(), key));

        let mut stmt = self.conn.prepare_cached(&get.sql)?;
        let row = stmt
            .query_row([key], |row| {
                (0..get.columns.len())
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })
            .optional()?;
        let Some(values) = row else {
            debug!(target: "sqlstore::store", table = %desc.name, key, "Row not found; key reset");
            return write_key(desc, &mut fields, 0);
        };

        let mut nested_slots = Vec::new();
        for (&index, value) in get.columns.iter().zip(values) {
            let column = &desc.fields[index];
            match fields[column.slot].value_mut() {
                FieldRef::Record(nested) => {
                    let nested_key = match value {
                        Value::Int(k) => k,
                        Value::Null => 0,
                        other => {
                            return Err(Error::Conversion {
                                column: column.name.clone(),
                                expected: "record key",
                                actual: other.type_name(),
                            })
                        }
                    };
                    self.set_key_of(&mut **nested, nested_key)?;
                    let seen = column.nested_type.as_ref().map_or(false, |name| {
                        pending.visited.contains(&(name.clone(), nested_key))
                    });
                    if nested_key != 0 && !seen {
                        nested_slots.push(column.slot);
                    }
                }
                other => other.set(&column.name, value)?,
            }
        }

        for (slot, field) in fields.into_iter().enumerate() {
            if !nested_slots.contains(&slot) {
                continue;
            }
            if let FieldRef::Record(nested) = field.into_value() {
                pending.queue.push_back(nested);
            }
        }
        Ok(())
    }

    fn query_keys(&self, sql: &str, params: Vec<Value>) -> Result<Vec<i64>> {
        debug!(target: "sqlstore::store", sql = %sql, "Key scan");
        let mut stmt = self.conn.prepare_cached(sql)?;
        let keys = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(keys)
    }
}

fn check_type(expected: &str, record: &dyn Record, index: usize) -> Result<()> {
    let found = canonical_name(record);
    if found == expected {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: expected.to_string(),
            found,
            index,
        })
    }
}

fn read_key(desc: &TypeDescriptor, fields: &[Field<'_>]) -> Result<i64> {
    let key = desc.key_field();
    fields[key.slot]
        .value()
        .key_value()
        .ok_or_else(|| Error::WrongKeyKind {
            table: desc.name.clone(),
            column: key.name.clone(),
        })
}

fn write_key(desc: &TypeDescriptor, fields: &mut [Field<'_>], key: i64) -> Result<()> {
    let column = desc.key_field();
    if fields[column.slot].value_mut().set_key_value(key) {
        Ok(())
    } else {
        Err(Error::WrongKeyKind {
            table: desc.name.clone(),
            column: column.name.clone(),
        })
    }
}

fn where_parts(clause: Option<WhereClause>) -> (String, Vec<Value>) {
    match clause {
        Some(clause) => (format!(" WHERE {}", clause.sql), clause.params),
        None => (String::new(), Vec::new()),
    }
}

fn sql_int(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}
