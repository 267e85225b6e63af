//! Core data types
//!
//! The closed set of field types a table may declare, the typed values stored
//! in records, and the record shape itself.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{DbError, Result};

/// Textual pattern used for timestamps in page files and index keys
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A record: field name → typed value
pub type Record = BTreeMap<String, Value>;

// =============================================================================
// Field Types
// =============================================================================

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Text,
    Timestamp,
}

impl FieldType {
    /// Tag written to the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Text => "text",
            FieldType::Timestamp => "timestamp",
        }
    }

    /// Estimated serialized size in bytes, used to size pages
    pub fn estimated_size(&self) -> usize {
        match self {
            FieldType::Integer => 20,
            FieldType::Text => 64,
            FieldType::Timestamp => 19,
        }
    }

    /// Parse the stored textual form of a value of this type
    pub fn parse_value(&self, text: &str) -> Option<Value> {
        match self {
            FieldType::Integer => text.trim().parse().ok().map(Value::Int),
            FieldType::Text => Some(Value::Text(text.to_string())),
            FieldType::Timestamp => NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
                .ok()
                .map(Value::Timestamp),
        }
    }
}

impl FromStr for FieldType {
    type Err = DbError;

    /// Accepts the canonical tags plus the short aliases older catalogs used
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "integer" | "int" => Ok(FieldType::Integer),
            "text" | "str" => Ok(FieldType::Text),
            "timestamp" | "datetime" => Ok(FieldType::Timestamp),
            other => Err(DbError::UnknownFieldType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Values
// =============================================================================

/// A typed field value
///
/// Ordering between two values of the same variant is the type's native
/// ordering: numeric, lexicographic, chronological.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Int(_) => FieldType::Integer,
            Value::Text(_) => FieldType::Text,
            Value::Timestamp(_) => FieldType::Timestamp,
        }
    }

    /// Whether the value survives its stored textual form unchanged.
    /// Timestamps are kept to whole seconds within years 0..=9999.
    pub fn is_storable(&self) -> bool {
        match self {
            Value::Timestamp(ts) => ts.nanosecond() == 0 && (0..=9999).contains(&ts.year()),
            _ => true,
        }
    }

    /// Textual form as stored on disk
    pub fn to_text(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.to_text()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

// =============================================================================
// Fields
// =============================================================================

/// A named, typed column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}
