//! Filtered and sorted search

use crate::*;
use sqlstore::{Error, Filter, Sort};

#[test]
fn between_is_inclusive() {
    let store = seeded_store();
    let mut found = buffer(10);
    let n = store
        .search(&mut batch(&mut found), 0, &[Filter::between("number", 5, 15)])
        .unwrap();
    assert_eq!(ids(&found, n), vec![2, 3]);
    assert_eq!(found[0].number, 7);
    assert_eq!(found[1].number, 12);

    let n = store
        .search(&mut batch(&mut found), 0, &[Filter::between("number", 7, 12)])
        .unwrap();
    assert_eq!(n, 2);
}

#[test]
fn limit_follows_buffer_and_offset_skips() {
    let store = seeded_store();
    let filters = [Filter::between("number", 5, 150)];

    let mut two = buffer(2);
    let n = store.search(&mut batch(&mut two), 1, &filters).unwrap();
    assert_eq!(ids(&two, n), vec![3, 5]);

    let mut one = buffer(1);
    let n = store.search(&mut batch(&mut one), 1, &filters).unwrap();
    assert_eq!(ids(&one, n), vec![3]);
}

#[test]
fn like_matches_pattern() {
    let store = seeded_store();
    let mut found = buffer(10);
    let n = store
        .search(&mut batch(&mut found), 0, &[Filter::like("data", "hello %")])
        .unwrap();
    assert_eq!(ids(&found, n), vec![1, 2]);
    assert_eq!(found[1].data, "hello there");
}

#[test]
fn not_like_and_negation() {
    let store = seeded_store();
    let template = TestType::default();
    assert_eq!(
        store
            .search_count(&template, &[Filter::not_like("data", "hello%")])
            .unwrap(),
        2
    );
    assert_eq!(
        store
            .search_count(&template, &[!Filter::like("data", "hello %")])
            .unwrap(),
        3
    );
}

#[test]
fn top_level_filters_are_conjoined() {
    let store = seeded_store();
    let mut found = buffer(10);
    let n = store
        .search(
            &mut batch(&mut found),
            0,
            &[
                Filter::like("data", "hello%"),
                Filter::between("number", 5, 1000),
            ],
        )
        .unwrap();
    assert_eq!(ids(&found, n), vec![2, 4]);
}

#[test]
fn or_composite() {
    let store = seeded_store();
    let mut found = buffer(10);
    let n = store
        .search(
            &mut batch(&mut found),
            0,
            &[Filter::or([
                Filter::equals("number", 4),
                Filter::equals("data", "farewell"),
            ])],
        )
        .unwrap();
    assert_eq!(ids(&found, n), vec![1, 5]);
}

#[test]
fn nested_composites() {
    let store = seeded_store();
    let filter = Filter::and([
        Filter::or([
            Filter::like("data", "good%"),
            Filter::like("data", "fare%"),
        ]),
        Filter::between("number", 0, 100),
    ]);
    assert_eq!(
        store.search_count(&TestType::default(), &[filter]).unwrap(),
        1
    );
}

#[test]
fn column_names_resolve_case_insensitively() {
    let store = seeded_store();
    assert_eq!(
        store
            .search_count(&TestType::default(), &[Filter::equals("NUMBER", 12)])
            .unwrap(),
        1
    );
}

#[test]
fn no_filters_matches_everything() {
    let store = seeded_store();
    let mut found = buffer(10);
    let n = store.search(&mut batch(&mut found), 0, &[]).unwrap();
    assert_eq!(ids(&found, n), vec![1, 2, 3, 4, 5]);
    assert_eq!(store.search_count(&TestType::default(), &[]).unwrap(), 5);
}

#[test]
fn unknown_column_rejected_without_query() {
    let store = seeded_store();
    let mut found = buffer(3);
    let err = store
        .search(&mut batch(&mut found), 0, &[Filter::equals("missing", 1)])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn(c) if c == "missing"));
    assert!(found.iter().all(|r| *r == TestType::default()));

    let err = store
        .search_sorted(&mut batch(&mut found), 0, &Sort::desc("missing"), &[])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn(_)));
}

#[test]
fn empty_composite_rejected() {
    let store = seeded_store();
    let mut found = buffer(3);
    let err = store
        .search(&mut batch(&mut found), 0, &[Filter::And(Vec::new())])
        .unwrap_err();
    assert!(matches!(err, Error::NoFilterParams));
}

#[test]
fn hostile_values_are_bound_not_spliced() {
    let store = seeded_store();
    let hostile = "x'); DROP TABLE [TestType]; --";
    assert_eq!(
        store
            .search_count(&TestType::default(), &[Filter::equals("data", hostile)])
            .unwrap(),
        0
    );
    assert_eq!(store.count(&TestType::default()).unwrap(), 5);
}

#[test]
fn sorted_descending() {
    let store = seeded_store();
    let mut found = buffer(3);
    let n = store
        .search_sorted(&mut batch(&mut found), 0, &Sort::desc("number"), &[])
        .unwrap();
    assert_eq!(ids(&found, n), vec![4, 5, 3]);
    assert_eq!(found[0].number, 765);
}

#[test]
fn sorted_with_filter_and_offset() {
    let store = seeded_store();
    let mut found = buffer(2);
    let n = store
        .search_sorted(
            &mut batch(&mut found),
            1,
            &Sort::asc("data"),
            &[Filter::like("data", "%o%")],
        )
        .unwrap();
    // "%o%" matches goodbye, hello there, hello world, hellothere
    assert_eq!(ids(&found, n), vec![2, 1]);
}

#[test]
fn search_count_ignores_paging() {
    let store = seeded_store();
    assert_eq!(
        store
            .search_count(&TestType::default(), &[Filter::between("number", 5, 150)])
            .unwrap(),
        3
    );
}
