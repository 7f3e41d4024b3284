//! Open, close, persistence and shared use

use crate::*;
use sqlstore::{Error, StoreConfig, CONFIG_FILE_NAME};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn close_is_terminal() {
    let store = seeded_store();
    store.close().unwrap();
    assert!(store.is_closed());

    let mut row = TestType::with_id(1);
    assert!(matches!(store.get(&mut [&mut row]), Err(Error::Closed)));
    assert!(matches!(
        store.search_count(&row, &[]),
        Err(Error::Closed)
    ));
    assert!(matches!(store.close(), Err(Error::Closed)));
    assert!(store.descriptor("TestType").is_none());
}

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");

    {
        let store = Store::open(&path, StoreConfig::default()).unwrap();
        store.register_type::<TestType>().unwrap();
        let mut row = TestType::new("durable", 3);
        store.set(&mut [&mut row]).unwrap();
        store.close().unwrap();
    }

    let store = Store::open(&path, StoreConfig::default()).unwrap();
    store.register_type::<TestType>().unwrap();
    let mut row = TestType::with_id(1);
    store.get(&mut [&mut row]).unwrap();
    assert_eq!(row.data, "durable");
    assert_eq!(row.number, 3);
}

#[test]
fn open_with_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &config_path,
        "statement_cache_capacity = 8\njournal_mode = \"delete\"\n",
    )
    .unwrap();

    let config = StoreConfig::from_file(&config_path).unwrap();
    assert_eq!(config.statement_cache_capacity, 8);
    let store = Store::open(dir.path().join("store.db"), config).unwrap();
    store.register_type::<TestType>().unwrap();
    store.register_type::<Shelf>().unwrap();

    // More statements than the cache holds still execute.
    let mut shelf = Shelf::default();
    store.set(&mut [&mut shelf]).unwrap();
    store.get(&mut [&mut shelf]).unwrap();
    assert_eq!(store.count(&Author::default()).unwrap(), 2);
}

#[test]
fn concurrent_writers_share_one_store() {
    let store = Arc::new(store());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..25 {
                    let mut row = TestType::new(&format!("t{}", t), n);
                    store.set(&mut [&mut row]).unwrap();
                    assert_ne!(row.id, 0);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.count(&TestType::default()).unwrap(), 100);
}
