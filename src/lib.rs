//! sqlstore - runtime object-relational store over SQLite
//!
//! A type becomes storable by implementing [`Record`]: it lists its fields,
//! each with a mutable handle to the value. Registering the type creates its
//! table; a [`Store`] then saves, loads, deletes, pages and searches batches
//! of records, following nested record references by key.
//!
//! # Quick Start
//!
//! ```
//! use sqlstore::{Field, Filter, Record, Store};
//!
//! #[derive(Default)]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Record for Person {
//!     fn describe(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("id", &mut self.id),
//!             Field::new("name", &mut self.name),
//!             Field::new("age", &mut self.age),
//!         ]
//!     }
//! }
//!
//! let store = Store::open_in_memory()?;
//! store.register_type::<Person>()?;
//!
//! let mut ada = Person { id: 0, name: "Ada".into(), age: 36 };
//! store.set(&mut [&mut ada])?;
//!
//! let adults = store.search_count(&Person::default(), &[Filter::between("age", 18, 120)])?;
//! assert_eq!(adults, 1);
//! # Ok::<(), sqlstore::Error>(())
//! ```

// Re-export the public API
pub use sqlstore_core::*;
pub use sqlstore_engine::*;
