//! Store Comprehensive Test Suite
//!
//! End-to-end coverage of the public `Store` API: registration, CRUD
//! batches, nested references, pagination, search and lifecycle.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test store_comprehensive
//!
//! # Run search tests only
//! cargo test --test store_comprehensive search::
//! ```

use sqlstore::{Field, Record, Store, Timestamp};

/// Flat record used by most tests
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TestType {
    pub id: i64,
    pub data: String,
    pub number: i32,
}

impl TestType {
    pub fn new(data: &str, number: i32) -> Self {
        TestType {
            id: 0,
            data: data.to_string(),
            number,
        }
    }

    pub fn with_id(id: i64) -> Self {
        TestType {
            id,
            ..TestType::default()
        }
    }
}

impl Record for TestType {
    fn describe(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("id", &mut self.id),
            Field::new("data", &mut self.data),
            Field::new("number", &mut self.number),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

impl Record for Author {
    fn describe(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("id", &mut self.id),
            Field::new("name", &mut self.name),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Author,
}

impl Record for Book {
    fn describe(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("id", &mut self.id),
            Field::new("title", &mut self.title),
            Field::record("author", &mut self.author),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Shelf {
    pub id: i64,
    pub label: String,
    pub first: Book,
    pub second: Book,
}

impl Record for Shelf {
    fn describe(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("id", &mut self.id),
            Field::new("label", &mut self.label),
            Field::record("first", &mut self.first),
            Field::record("second", &mut self.second),
        ]
    }
}

/// Every supported scalar kind
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AllKinds {
    pub id: i32,
    pub small: i32,
    pub big: i64,
    pub ratio: f32,
    pub precise: f64,
    pub text: String,
    pub flag: bool,
    pub bytes: Vec<u8>,
    pub at: Timestamp,
}

impl Record for AllKinds {
    fn describe(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("id", &mut self.id),
            Field::new("small", &mut self.small),
            Field::new("big", &mut self.big),
            Field::new("ratio", &mut self.ratio),
            Field::new("precise", &mut self.precise),
            Field::new("text", &mut self.text),
            Field::new("flag", &mut self.flag),
            Field::new("bytes", &mut self.bytes),
            Field::new("at", &mut self.at),
        ]
    }
}

/// Borrow a slice of records as a batch
pub fn batch<T: Record>(items: &mut [T]) -> Vec<&mut dyn Record> {
    items.iter_mut().map(|r| r as &mut dyn Record).collect()
}

/// In-memory store with `TestType` registered
pub fn store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.register_type::<TestType>().unwrap();
    store
}

/// In-memory store seeded with five `TestType` rows (ids 1..=5)
///
/// | id | data          | number |
/// |----|---------------|--------|
/// | 1  | hello world   | 4      |
/// | 2  | hello there   | 7      |
/// | 3  | goodbye       | 12     |
/// | 4  | hellothere    | 765    |
/// | 5  | farewell      | 123    |
pub fn seeded_store() -> Store {
    let store = store();
    let mut rows = vec![
        TestType::new("hello world", 4),
        TestType::new("hello there", 7),
        TestType::new("goodbye", 12),
        TestType::new("hellothere", 765),
        TestType::new("farewell", 123),
    ];
    store.set(&mut batch(&mut rows)).unwrap();
    assert_eq!(
        rows.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
    store
}

/// Blank buffer of `n` records for reads
pub fn buffer(n: usize) -> Vec<TestType> {
    vec![TestType::default(); n]
}

/// Keys of the first `n` records of a read buffer
pub fn ids(items: &[TestType], n: usize) -> Vec<i64> {
    items[..n].iter().map(|r| r.id).collect()
}

mod crud;
mod lifecycle;
mod search;
