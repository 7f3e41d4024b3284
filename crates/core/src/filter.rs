//! Filter expressions for ad-hoc search
//!
//! A [`Filter`] is a closed predicate tree. Rendering walks it depth first,
//! left to right, producing a WHERE fragment with `?` placeholders and the
//! values to bind, in placeholder order. Literals never appear in the SQL
//! text.
//!
//! ```
//! use sqlstore_core::Filter;
//!
//! let f = Filter::or([
//!     Filter::between("number", 5, 15),
//!     Filter::like("data", "hello %"),
//! ]);
//! let clause = f.render(&["id", "data", "number"][..]).unwrap();
//! assert_eq!(clause.sql, "([number] BETWEEN ? AND ? OR [data] LIKE ?)");
//! assert_eq!(clause.params.len(), 3);
//! ```

use crate::error::{Error, Result};
use crate::value::Value;

/// Bracket-quote an identifier
pub fn quote_ident(ident: &str) -> String {
    format!("[{}]", ident)
}

/// Resolves user-supplied column names against a type's columns
pub trait Columns {
    /// Canonical spelling of `column`, or `None` if the type has no such column
    fn resolve(&self, column: &str) -> Option<&str>;
}

impl Columns for [&str] {
    fn resolve(&self, column: &str) -> Option<&str> {
        self.iter()
            .find(|c| c.eq_ignore_ascii_case(column))
            .copied()
    }
}

/// Composable search predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `[column] = ?`
    Equals {
        /// Column name
        column: String,
        /// Value to compare against
        value: Value,
    },
    /// `[column] BETWEEN ? AND ?` (inclusive)
    Between {
        /// Column name
        column: String,
        /// Lower bound
        low: Value,
        /// Upper bound
        high: Value,
    },
    /// `[column] LIKE ?`
    Like {
        /// Column name
        column: String,
        /// SQL LIKE pattern
        pattern: String,
    },
    /// `[column] NOT LIKE ?`
    NotLike {
        /// Column name
        column: String,
        /// SQL LIKE pattern
        pattern: String,
    },
    /// All children must match
    And(Vec<Filter>),
    /// Any child must match
    Or(Vec<Filter>),
    /// Child must not match
    Not(Box<Filter>),
}

impl Filter {
    /// Equality leaf
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Inclusive range leaf
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Filter::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// LIKE leaf
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// NOT LIKE leaf
    pub fn not_like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::NotLike {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// Conjunction
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Disjunction
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Render to a WHERE fragment (without the `WHERE` keyword)
    pub fn render<C: Columns + ?Sized>(&self, columns: &C) -> Result<WhereClause> {
        let mut out = WhereClause::default();
        self.render_into(columns, &mut out)?;
        Ok(out)
    }

    fn render_into<C: Columns + ?Sized>(&self, columns: &C, out: &mut WhereClause) -> Result<()> {
        match self {
            Filter::Equals { column, value } => {
                out.push_column(columns, column)?;
                out.sql.push_str(" = ?");
                out.params.push(value.clone());
            }
            Filter::Between { column, low, high } => {
                out.push_column(columns, column)?;
                out.sql.push_str(" BETWEEN ? AND ?");
                out.params.push(low.clone());
                out.params.push(high.clone());
            }
            Filter::Like { column, pattern } => {
                out.push_column(columns, column)?;
                out.sql.push_str(" LIKE ?");
                out.params.push(Value::Text(pattern.clone()));
            }
            Filter::NotLike { column, pattern } => {
                out.push_column(columns, column)?;
                out.sql.push_str(" NOT LIKE ?");
                out.params.push(Value::Text(pattern.clone()));
            }
            Filter::And(children) => render_composite(children, " AND ", columns, out)?,
            Filter::Or(children) => render_composite(children, " OR ", columns, out)?,
            Filter::Not(child) => {
                out.sql.push_str("NOT (");
                child.render_into(columns, out)?;
                out.sql.push(')');
            }
        }
        Ok(())
    }
}

impl std::ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }
}

fn render_composite<C: Columns + ?Sized>(
    children: &[Filter],
    keyword: &str,
    columns: &C,
    out: &mut WhereClause,
) -> Result<()> {
    if children.is_empty() {
        return Err(Error::NoFilterParams);
    }
    out.sql.push('(');
    for (n, child) in children.iter().enumerate() {
        if n > 0 {
            out.sql.push_str(keyword);
        }
        child.render_into(columns, out)?;
    }
    out.sql.push(')');
    Ok(())
}

/// Rendered WHERE fragment and its bound values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// SQL fragment with `?` placeholders
    pub sql: String,
    /// Values for the placeholders, in order
    pub params: Vec<Value>,
}

impl WhereClause {
    /// Render a list of top-level filters joined with AND
    ///
    /// An empty list yields `None`: no WHERE clause, match everything.
    pub fn from_filters<C: Columns + ?Sized>(
        filters: &[Filter],
        columns: &C,
    ) -> Result<Option<WhereClause>> {
        if filters.is_empty() {
            return Ok(None);
        }
        let mut out = WhereClause::default();
        for (n, filter) in filters.iter().enumerate() {
            if n > 0 {
                out.sql.push_str(" AND ");
            }
            filter.render_into(columns, &mut out)?;
        }
        Ok(Some(out))
    }

    fn push_column<C: Columns + ?Sized>(&mut self, columns: &C, column: &str) -> Result<()> {
        let resolved = columns
            .resolve(column)
            .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        self.sql.push_str(&quote_ident(resolved));
        Ok(())
    }
}

/// Result ordering for search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Column to order by
    pub column: String,
    /// Ascending if true
    pub ascending: bool,
}

impl Sort {
    /// Ascending order on `column`
    pub fn asc(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            ascending: true,
        }
    }

    /// Descending order on `column`
    pub fn desc(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            ascending: false,
        }
    }

    /// Render to an ORDER BY term list, breaking ties on `key`
    pub fn render<C: Columns + ?Sized>(&self, columns: &C, key: &str) -> Result<String> {
        let column = columns
            .resolve(&self.column)
            .ok_or_else(|| Error::UnknownColumn(self.column.clone()))?;
        let direction = if self.ascending { "ASC" } else { "DESC" };
        if column == key {
            Ok(format!("{} {}", quote_ident(column), direction))
        } else {
            Ok(format!(
                "{} {}, {} ASC",
                quote_ident(column),
                direction,
                quote_ident(key)
            ))
        }
    }
}
