//! Table schema
//!
//! Ordered field list plus the designated key field. Rows on disk always use
//! the declared field order; records handed to callers are keyed by name.

use std::collections::HashSet;

use crate::error::{DbError, Result};
use crate::types::{Field, FieldType, Record, Value};

/// A stored row: values in declared field order
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
    key_field: String,
    key_pos: usize,
}

impl Schema {
    /// Build a schema, rejecting empty field lists, duplicate names and a key
    /// field that is not one of the fields
    pub fn new(fields: Vec<Field>, key_field: impl Into<String>) -> Result<Self> {
        let key_field = key_field.into();

        if fields.is_empty() {
            return Err(DbError::SchemaMismatch(
                "a table needs at least one field".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(DbError::SchemaMismatch(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        let key_pos = fields
            .iter()
            .position(|f| f.name == key_field)
            .ok_or_else(|| {
                DbError::SchemaMismatch(format!("key field '{}' is not a declared field", key_field))
            })?;

        Ok(Self {
            fields,
            key_field,
            key_pos,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn key_type(&self) -> FieldType {
        self.fields[self.key_pos].field_type
    }

    /// Column types in declared order
    pub fn field_types(&self) -> Vec<FieldType> {
        self.fields.iter().map(|f| f.field_type).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Look up a field, failing with `UnknownColumn`
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| DbError::UnknownColumn(name.to_string()))
    }

    /// Records per page for the given byte budget, at least one and at most
    /// what a page offset can address
    pub fn capacity(&self, budget_bytes: usize) -> usize {
        let row_size: usize = self.fields.iter().map(|f| f.field_type.estimated_size()).sum();
        (budget_bytes / row_size).clamp(1, u32::MAX as usize)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// `values` must cover exactly the declared fields with matching types
    pub fn check_full(&self, values: &Record) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(DbError::SchemaMismatch(format!(
                "expected {} fields, got {}",
                self.fields.len(),
                values.len()
            )));
        }
        self.check_partial(values)
    }

    /// Every supplied field must exist and carry its declared type
    pub fn check_partial(&self, values: &Record) -> Result<()> {
        for (name, value) in values {
            let pos = self.position(name).ok_or_else(|| {
                DbError::SchemaMismatch(format!("'{}' is not a field of this table", name))
            })?;
            let declared = self.fields[pos].field_type;
            if value.field_type() != declared {
                return Err(DbError::SchemaMismatch(format!(
                    "field '{}' is {}, got {}",
                    name,
                    declared,
                    value.field_type()
                )));
            }
            if !value.is_storable() {
                return Err(DbError::SchemaMismatch(format!(
                    "field '{}' cannot store {:?} without loss",
                    name, value
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Row <-> Record
    // =========================================================================

    /// Lay out a validated record in declared field order
    pub fn to_row(&self, record: &Record) -> Result<Row> {
        self.fields
            .iter()
            .map(|f| {
                record
                    .get(&f.name)
                    .cloned()
                    .ok_or_else(|| DbError::SchemaMismatch(format!("missing field '{}'", f.name)))
            })
            .collect()
    }

    pub fn to_record(&self, row: Row) -> Record {
        self.fields
            .iter()
            .map(|f| f.name.clone())
            .zip(row)
            .collect()
    }

    pub fn key_of<'a>(&self, row: &'a Row) -> Result<&'a Value> {
        row.get(self.key_pos)
            .ok_or_else(|| DbError::Corruption("row is missing its key column".to_string()))
    }
}
