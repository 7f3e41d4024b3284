//! Statement generation
//!
//! Every registered type gets one `CrudStatementSet`, generated once from its
//! field descriptors. Statements carry the ordered field indices they bind
//! (`binds`) and, for reads, the field indices their result columns fill
//! (`columns`). Execution goes through the connection's prepared-statement
//! cache, so each SQL text is compiled once and reused.

use crate::introspect::FieldDescriptor;
use sqlstore_core::quote_ident;

/// One SQL statement with its binding order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text with `?` placeholders
    pub sql: String,
    /// Field indices bound to the placeholders, in order
    pub binds: Vec<usize>,
    /// Field indices filled from the result columns, in order
    pub columns: Vec<usize>,
}

impl Statement {
    fn new(sql: String, binds: Vec<usize>, columns: Vec<usize>) -> Self {
        Statement {
            sql,
            binds,
            columns,
        }
    }
}

/// The statements of a single registered type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudStatementSet {
    /// `CREATE TABLE IF NOT EXISTS`
    pub create: String,
    /// Insert all non-key columns
    pub insert: Statement,
    /// Select all non-key columns by key
    pub get: Statement,
    /// Update all non-key columns by key
    pub update: Statement,
    /// Delete by key
    pub delete: Statement,
    /// Select a page of keys in ascending key order; binds LIMIT and OFFSET
    pub page: Statement,
    /// Count all rows
    pub count: Statement,
}

impl CrudStatementSet {
    /// Generate the statements for `table` with key `fields[key]`
    pub fn build(table: &str, fields: &[FieldDescriptor], key: usize) -> Self {
        let t = quote_ident(table);
        let k = quote_ident(&fields[key].name);
        let others: Vec<usize> = (0..fields.len()).filter(|&i| i != key).collect();
        let names: Vec<String> = others.iter().map(|&i| quote_ident(&fields[i].name)).collect();

        let mut create = format!(
            "CREATE TABLE IF NOT EXISTS {}({} {} PRIMARY KEY AUTOINCREMENT",
            t,
            k,
            fields[key].kind.sql_type()
        );
        for (name, &i) in names.iter().zip(&others) {
            create.push_str(&format!(", {} {}", name, fields[i].kind.sql_type()));
        }
        create.push_str(");");

        let insert = if others.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES;", t)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({});",
                t,
                names.join(","),
                vec!["?"; others.len()].join(",")
            )
        };

        let get = if others.is_empty() {
            format!("SELECT {} FROM {} WHERE {} = ? LIMIT 1;", k, t, k)
        } else {
            format!(
                "SELECT {} FROM {} WHERE {} = ? LIMIT 1;",
                names.join(","),
                t,
                k
            )
        };

        // A key-only table has nothing to set; the self-assignment still
        // reports whether the row exists.
        let update = if others.is_empty() {
            format!("UPDATE {} SET {}={} WHERE {} = ?;", t, k, k, k)
        } else {
            let sets: Vec<String> = names.iter().map(|n| format!("{}=?", n)).collect();
            format!("UPDATE {} SET {} WHERE {} = ?;", t, sets.join(","), k)
        };
        let mut update_binds = others.clone();
        update_binds.push(key);

        CrudStatementSet {
            create,
            insert: Statement::new(insert, others.clone(), Vec::new()),
            get: Statement::new(get, vec![key], others),
            update: Statement::new(update, update_binds, Vec::new()),
            delete: Statement::new(
                format!("DELETE FROM {} WHERE {} = ?;", t, k),
                vec![key],
                Vec::new(),
            ),
            page: Statement::new(
                format!("SELECT {} FROM {} ORDER BY {} LIMIT ? OFFSET ?;", k, t, k),
                Vec::new(),
                vec![key],
            ),
            count: Statement::new(
                format!("SELECT COUNT(1) FROM {};", t),
                Vec::new(),
                Vec::new(),
            ),
        }
    }
}
