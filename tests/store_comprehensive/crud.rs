//! Set / insert / update / get / delete batches

use crate::*;
use sqlstore::Error;

#[test]
fn set_zero_key_inserts_and_writes_key_back() {
    let store = store();
    let mut a = TestType::new("a", 1);
    let mut b = TestType::new("b", 2);
    store.set(&mut [&mut a, &mut b]).unwrap();
    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);
    assert_eq!(store.count(&TestType::default()).unwrap(), 2);
}

#[test]
fn set_then_get_round_trips() {
    let store = store();
    let mut saved = TestType::new("round trip", 42);
    store.set(&mut [&mut saved]).unwrap();

    let mut loaded = TestType::with_id(saved.id);
    store.get(&mut [&mut loaded]).unwrap();
    assert_eq!(loaded, saved);
}

#[test]
fn set_existing_key_updates_in_place() {
    let store = store();
    let mut row = TestType::new("before", 1);
    store.set(&mut [&mut row]).unwrap();
    let id = row.id;

    row.data = "after".into();
    row.number = 2;
    store.set(&mut [&mut row]).unwrap();
    assert_eq!(row.id, id);
    assert_eq!(store.count(&row).unwrap(), 1);

    let mut loaded = TestType::with_id(id);
    store.get(&mut [&mut loaded]).unwrap();
    assert_eq!(loaded.data, "after");
    assert_eq!(loaded.number, 2);
}

#[test]
fn set_unknown_key_falls_back_to_insert() {
    let store = store();
    let mut first = TestType::new("first", 1);
    store.set(&mut [&mut first]).unwrap();

    let mut stray = TestType {
        id: 99,
        data: "stray".into(),
        number: 3,
    };
    store.set(&mut [&mut stray]).unwrap();
    // The database assigns the key; 99 is not reused.
    assert_eq!(stray.id, 2);
    assert_eq!(store.count(&stray).unwrap(), 2);
}

#[test]
fn insert_always_adds_a_row() {
    let store = store();
    let mut row = TestType::new("dup", 1);
    store.insert(&mut [&mut row]).unwrap();
    assert_eq!(row.id, 1);
    store.insert(&mut [&mut row]).unwrap();
    assert_eq!(row.id, 2);
    assert_eq!(store.count(&row).unwrap(), 2);
}

#[test]
fn update_reports_rows_found() {
    let store = seeded_store();
    let mut existing = TestType {
        id: 2,
        data: "changed".into(),
        number: 8,
    };
    let mut missing = TestType {
        id: 40,
        data: "nowhere".into(),
        number: 0,
    };
    let mut unsaved = TestType::new("unsaved", 1);
    let updated = store
        .update(&mut [&mut existing, &mut missing, &mut unsaved])
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(missing.id, 40);
    assert_eq!(unsaved.id, 0);
    assert_eq!(store.count(&existing).unwrap(), 5);
}

#[test]
fn get_zero_key_is_untouched() {
    let store = seeded_store();
    let mut row = TestType::new("local", 9);
    store.get(&mut [&mut row]).unwrap();
    assert_eq!(row, TestType::new("local", 9));
}

#[test]
fn get_missing_key_resets_key_only() {
    let store = seeded_store();
    let mut row = TestType {
        id: 42,
        data: "local".into(),
        number: 9,
    };
    store.get(&mut [&mut row]).unwrap();
    assert_eq!(row.id, 0);
    assert_eq!(row.data, "local");
    assert_eq!(row.number, 9);
}

#[test]
fn get_batch_fills_every_record() {
    let store = seeded_store();
    let mut rows: Vec<TestType> = [5, 1, 3].into_iter().map(TestType::with_id).collect();
    store.get(&mut batch(&mut rows)).unwrap();
    assert_eq!(rows[0].data, "farewell");
    assert_eq!(rows[1].data, "hello world");
    assert_eq!(rows[2].number, 12);
}

#[test]
fn delete_removes_rows() {
    let store = seeded_store();
    let mut a = TestType::with_id(1);
    let mut b = TestType::with_id(4);
    store.delete(&mut [&mut a, &mut b]).unwrap();
    assert_eq!(store.count(&a).unwrap(), 3);

    store.get(&mut [&mut a]).unwrap();
    assert_eq!(a.id, 0);
}

#[test]
fn delete_missing_key_is_not_an_error() {
    let store = seeded_store();
    let mut ghost = TestType::with_id(1000);
    store.delete(&mut [&mut ghost]).unwrap();
    assert_eq!(store.count(&ghost).unwrap(), 5);
}

#[test]
fn mixed_batch_stops_at_first_mismatch() {
    let store = store();
    store.register_type::<Author>().unwrap();

    let mut a = TestType::new("a", 1);
    let mut stranger = Author {
        id: 0,
        name: "stranger".into(),
    };
    let mut c = TestType::new("c", 3);
    let err = store
        .set(&mut [&mut a, &mut stranger, &mut c])
        .unwrap_err();

    match err {
        Error::TypeMismatch {
            expected,
            found,
            index,
        } => {
            assert_eq!(expected, "TestType");
            assert_eq!(found, "Author");
            assert_eq!(index, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(a.id, 1);
    assert_eq!(c.id, 0);
    assert_eq!(store.count(&a).unwrap(), 1);
    assert_eq!(store.count(&stranger).unwrap(), 0);
}

#[test]
fn every_scalar_kind_round_trips() {
    let store = Store::open_in_memory().unwrap();
    store.register_type::<AllKinds>().unwrap();

    let mut saved = AllKinds {
        id: 0,
        small: -7,
        big: i64::MAX - 1,
        ratio: 0.5,
        precise: std::f64::consts::PI,
        text: "ünïcödé".into(),
        flag: true,
        bytes: vec![0, 1, 2, 255],
        at: Timestamp::from_micros(1_700_000_000_123_456),
    };
    store.set(&mut [&mut saved]).unwrap();
    assert_eq!(saved.id, 1);

    let mut loaded = AllKinds {
        id: 1,
        ..AllKinds::default()
    };
    store.get(&mut [&mut loaded]).unwrap();
    assert_eq!(loaded, saved);
}
