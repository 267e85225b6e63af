//! Tests for KeyIndex
//!
//! These tests verify:
//! - Every mutation is flushed to the persisted image
//! - Duplicate and missing keys are rejected
//! - Load parses persisted keys by the declared key type
//! - Rebuild from pages

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDate;
use pagedb::index::{IndexImage, KeyIndex};
use pagedb::persist::{MemoryStore, Persist};
use pagedb::schema::{Row, Schema};
use pagedb::storage::Location;
use pagedb::{DbError, Field, FieldType, Result, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_index(key_type: FieldType) -> (Rc<MemoryStore<IndexImage>>, KeyIndex) {
    let store = Rc::new(MemoryStore::<IndexImage>::new());
    let index = KeyIndex::new(key_type, Box::new(store.clone()));
    (store, index)
}

fn image(entries: &[(&str, u32, u32)]) -> IndexImage {
    entries
        .iter()
        .map(|(k, p, o)| (k.to_string(), vec![Location::new(*p, *o)]))
        .collect()
}

fn schema() -> Schema {
    Schema::new(
        vec![
            Field::new("name", FieldType::Text),
            Field::new("id", FieldType::Integer),
        ],
        "id",
    )
    .unwrap()
}

fn page(n: u32, ids: &[i64]) -> Result<(u32, Vec<Row>)> {
    let rows = ids
        .iter()
        .map(|id| vec![Value::Text(format!("n{}", id)), Value::Int(*id)])
        .collect();
    Ok((n, rows))
}

// =============================================================================
// Mutations
// =============================================================================

#[test]
fn test_new_index_writes_nothing() {
    let (store, index) = setup_index(FieldType::Integer);

    assert!(index.is_empty());
    assert_eq!(store.store_count(), 0);
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_every_mutation_is_flushed() {
    let (store, mut index) = setup_index(FieldType::Integer);

    index.insert(Value::Int(1), Location::new(1, 0)).unwrap();
    assert_eq!(store.store_count(), 1);

    index.insert(Value::Int(2), Location::new(1, 1)).unwrap();
    assert_eq!(store.store_count(), 2);

    index.relocate(&Value::Int(2), Location::new(1, 0)).unwrap();
    assert_eq!(store.store_count(), 3);

    index.remove(&Value::Int(1)).unwrap();
    assert_eq!(store.store_count(), 4);

    assert_eq!(store.load().unwrap(), Some(image(&[("2", 1, 0)])));
}

#[test]
fn test_insert_duplicate_key() {
    let (store, mut index) = setup_index(FieldType::Integer);
    index.insert(Value::Int(1), Location::new(1, 0)).unwrap();

    let result = index.insert(Value::Int(1), Location::new(1, 1));

    assert!(matches!(result, Err(DbError::DuplicateKey(_))));
    assert_eq!(index.lookup(&Value::Int(1)).unwrap(), Location::new(1, 0));
    assert_eq!(store.store_count(), 1);
}

#[test]
fn test_missing_key_operations() {
    let (store, mut index) = setup_index(FieldType::Integer);

    assert!(matches!(index.lookup(&Value::Int(9)), Err(DbError::KeyNotFound(_))));
    assert!(matches!(index.remove(&Value::Int(9)), Err(DbError::KeyNotFound(_))));
    assert!(matches!(
        index.relocate(&Value::Int(9), Location::new(1, 0)),
        Err(DbError::KeyNotFound(_))
    ));
    assert!(!index.contains(&Value::Int(9)));
    assert_eq!(store.store_count(), 0);
}

#[test]
fn test_destroy_forgets_image() {
    let (store, mut index) = setup_index(FieldType::Text);
    index.insert(Value::from("a"), Location::new(1, 0)).unwrap();

    index.destroy().unwrap();

    assert_eq!(store.load().unwrap(), None);
}

// =============================================================================
// Load
// =============================================================================

#[test]
fn test_load_absent_image() {
    let store = MemoryStore::<IndexImage>::new();

    let loaded = KeyIndex::load(FieldType::Integer, Box::new(store)).unwrap();

    assert!(loaded.is_none());
}

#[test]
fn test_load_parses_keys_by_type() {
    let store = MemoryStore::<IndexImage>::new();
    store
        .store(&image(&[("2024-01-05 08:30:00", 1, 0), ("2023-12-31 23:59:59", 2, 3)]))
        .unwrap();

    let index = KeyIndex::load(FieldType::Timestamp, Box::new(store))
        .unwrap()
        .unwrap();

    let newest = NaiveDate::from_ymd_opt(2024, 1, 5)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.key_type(), FieldType::Timestamp);
    assert_eq!(
        index.lookup(&Value::Timestamp(newest)).unwrap(),
        Location::new(1, 0)
    );
}

#[test]
fn test_load_rejects_malformed_image() {
    let bad_key = MemoryStore::<IndexImage>::new();
    bad_key.store(&image(&[("seven", 1, 0)])).unwrap();
    assert!(matches!(
        KeyIndex::load(FieldType::Integer, Box::new(bad_key)),
        Err(DbError::Corruption(_))
    ));

    let two_locations = MemoryStore::<IndexImage>::new();
    two_locations
        .store(&BTreeMap::from([(
            "7".to_string(),
            vec![Location::new(1, 0), Location::new(1, 1)],
        )]))
        .unwrap();
    assert!(matches!(
        KeyIndex::load(FieldType::Integer, Box::new(two_locations)),
        Err(DbError::Corruption(_))
    ));
}

// =============================================================================
// Rebuild
// =============================================================================

#[test]
fn test_rebuild_from_pages() {
    let store = Rc::new(MemoryStore::<IndexImage>::new());

    let index = KeyIndex::rebuild(
        &schema(),
        vec![page(1, &[10, 20]), page(2, &[30])],
        Box::new(store.clone()),
    )
    .unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(index.lookup(&Value::Int(30)).unwrap(), Location::new(2, 0));
    assert_eq!(store.store_count(), 1);
    assert_eq!(
        store.load().unwrap(),
        Some(image(&[("10", 1, 0), ("20", 1, 1), ("30", 2, 0)]))
    );
}

#[test]
fn test_rebuild_detects_duplicate_keys() {
    let store = MemoryStore::<IndexImage>::new();

    let result = KeyIndex::rebuild(
        &schema(),
        vec![page(1, &[10, 20]), page(2, &[10])],
        Box::new(store),
    );

    assert!(matches!(result, Err(DbError::DuplicateKey(_))));
}

#[test]
fn test_rebuild_propagates_page_errors() {
    let store = MemoryStore::<IndexImage>::new();
    let pages = vec![
        page(1, &[1]),
        Err(DbError::Corruption("bad page".to_string())),
    ];

    let result = KeyIndex::rebuild(&schema(), pages, Box::new(store));

    assert!(matches!(result, Err(DbError::Corruption(_))));
}
