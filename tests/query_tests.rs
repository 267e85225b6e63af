//! Tests for criteria and predicates
//!
//! These tests verify:
//! - Parsing `field<op>value` expressions against a schema
//! - Operator semantics per field type
//! - Predicate compilation errors

use chrono::NaiveDate;
use pagedb::query::{matches_all, Criterion, Operator, Predicate};
use pagedb::schema::Schema;
use pagedb::{DbError, Field, FieldType, Record, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn schema() -> Schema {
    Schema::new(
        vec![
            Field::new("id", FieldType::Integer),
            Field::new("name", FieldType::Text),
            Field::new("seen", FieldType::Timestamp),
        ],
        "id",
    )
    .unwrap()
}

fn ts(y: i32, m: u32, d: u32) -> Value {
    Value::Timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
}

// =============================================================================
// Criterion::parse
// =============================================================================

#[test]
fn test_parse_each_operator() {
    let cases = [
        ("id<5", Operator::Lt),
        ("id>5", Operator::Gt),
        ("id=5", Operator::Eq),
        ("id>=5", Operator::Ge),
        ("id<=5", Operator::Le),
    ];

    for (expr, op) in cases {
        let parsed = Criterion::parse(expr, &schema()).unwrap();
        assert_eq!(parsed, Criterion::new("id", op, Value::Int(5)), "{}", expr);
    }
}

#[test]
fn test_parse_types_value_by_field() {
    let text = Criterion::parse("name=a=b", &schema()).unwrap();
    assert_eq!(text, Criterion::new("name", Operator::Eq, "a=b"));

    let stamp = Criterion::parse("seen>=2024-02-01 00:00:00", &schema()).unwrap();
    assert_eq!(stamp.value, ts(2024, 2, 1));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        Criterion::parse("id", &schema()),
        Err(DbError::InvalidArgument(_))
    ));
    assert!(matches!(
        Criterion::parse("age>3", &schema()),
        Err(DbError::UnknownColumn(_))
    ));
    assert!(matches!(
        Criterion::parse("id=three", &schema()),
        Err(DbError::InvalidArgument(_))
    ));
}

#[test]
fn test_operator_from_str() {
    assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Ge);
    assert!("!=".parse::<Operator>().is_err());
}

// =============================================================================
// Matching
// =============================================================================

#[test]
fn test_ordering_per_type() {
    assert!(Operator::Lt.holds(&Value::Int(-3), &Value::Int(2)));
    assert!(Operator::Gt.holds(&Value::from("b"), &Value::from("abc")));
    assert!(Operator::Le.holds(&ts(2023, 1, 1), &ts(2023, 1, 1)));
    assert!(!Operator::Eq.holds(&Value::from("A"), &Value::from("a")));
}

#[test]
fn test_record_matching() {
    let record: Record = [
        ("id".to_string(), Value::Int(7)),
        ("name".to_string(), Value::from("Ana")),
    ]
    .into_iter()
    .collect();

    let criteria = vec![
        Criterion::new("id", Operator::Ge, Value::Int(7)),
        Criterion::new("name", Operator::Eq, "Ana"),
    ];
    assert!(matches_all(&record, &criteria));
    assert!(matches_all(&record, &[]));

    // A field the record lacks never matches
    let missing = Criterion::new("seen", Operator::Lt, ts(2030, 1, 1));
    assert!(!missing.matches(&record));
}

#[test]
fn test_predicate_compile_and_match() {
    let predicate = Predicate::compile(
        &schema(),
        &[
            Criterion::new("id", Operator::Gt, Value::Int(1)),
            Criterion::new("seen", Operator::Lt, ts(2024, 1, 1)),
        ],
    )
    .unwrap();

    assert!(predicate.matches(&vec![Value::Int(2), Value::from("x"), ts(2023, 6, 1)]));
    assert!(!predicate.matches(&vec![Value::Int(2), Value::from("x"), ts(2024, 6, 1)]));
    assert!(!predicate.matches(&vec![Value::Int(1), Value::from("x"), ts(2023, 6, 1)]));
}

#[test]
fn test_predicate_compile_errors() {
    let unknown = Predicate::compile(&schema(), &[Criterion::new("age", Operator::Eq, Value::Int(1))]);
    assert!(matches!(unknown, Err(DbError::UnknownColumn(c)) if c == "age"));

    let mismatched = Predicate::compile(&schema(), &[Criterion::new("id", Operator::Eq, "1")]);
    assert!(matches!(mismatched, Err(DbError::SchemaMismatch(_))));
}

#[test]
fn test_predicate_rejects_unstorable_timestamps() {
    let sub_second = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_milli_opt(0, 0, 0, 250)
        .unwrap();
    let far_future = NaiveDate::from_ymd_opt(10000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    for value in [sub_second, far_future] {
        let result = Predicate::compile(
            &schema(),
            &[Criterion::new("seen", Operator::Lt, Value::Timestamp(value))],
        );
        assert!(matches!(result, Err(DbError::SchemaMismatch(_))));
    }
}

#[test]
fn test_storable_values() {
    assert!(Value::Int(i64::MIN).is_storable());
    assert!(Value::from("").is_storable());
    assert!(ts(0, 1, 1).is_storable());
    assert!(ts(9999, 12, 31).is_storable());
    assert!(!ts(-1, 12, 31).is_storable());
    assert!(!ts(10000, 1, 1).is_storable());
}
