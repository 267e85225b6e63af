//! Selection criteria
//!
//! A criterion is `(field, operator, value)`; a list of criteria is a logical
//! AND. Comparisons use the field type's native ordering.

use std::fmt;
use std::str::FromStr;

use crate::error::{DbError, Result};
use crate::schema::{Row, Schema};
use crate::types::{Record, Value};

/// Comparison operator of a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Gt,
    Eq,
    Ge,
    Le,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Eq => "=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }

    /// Whether `left <op> right` holds
    pub fn holds(&self, left: &Value, right: &Value) -> bool {
        match self {
            Operator::Lt => left < right,
            Operator::Gt => left > right,
            Operator::Eq => left == right,
            Operator::Ge => left >= right,
            Operator::Le => left <= right,
        }
    }
}

impl FromStr for Operator {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "=" => Ok(Operator::Eq),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            other => Err(DbError::InvalidArgument(format!("unknown operator '{}'", other))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// =============================================================================
// Criterion
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Criterion {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Parse `field<op>value` (e.g. `age>=30`), typing the value by the
    /// field's declared type
    pub fn parse(expr: &str, schema: &Schema) -> Result<Self> {
        let pos = expr.find(|c: char| c == '<' || c == '>' || c == '=').ok_or_else(|| {
            DbError::InvalidArgument(format!("no operator in criterion '{}'", expr))
        })?;
        let op = if expr[pos..].starts_with("<=") || expr[pos..].starts_with(">=") {
            &expr[pos..pos + 2]
        } else {
            &expr[pos..pos + 1]
        };

        let field = expr[..pos].trim();
        let raw = &expr[pos + op.len()..];
        let declared = schema.field(field)?.field_type;
        let value = declared.parse_value(raw).ok_or_else(|| {
            DbError::InvalidArgument(format!("'{}' is not a valid {}", raw, declared))
        })?;

        Ok(Self {
            field: field.to_string(),
            op: op.parse()?,
            value,
        })
    }

    /// Whether a record satisfies this criterion; a missing field never does
    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.field)
            .map(|v| self.op.holds(v, &self.value))
            .unwrap_or(false)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Whether a record satisfies every criterion
pub fn matches_all(record: &Record, criteria: &[Criterion]) -> bool {
    criteria.iter().all(|c| c.matches(record))
}

// =============================================================================
// Compiled Predicate
// =============================================================================

/// Criteria resolved against a schema to column positions, for scanning rows
#[derive(Debug, Clone)]
pub struct Predicate {
    terms: Vec<(usize, Operator, Value)>,
}

impl Predicate {
    /// Resolve criteria; `UnknownColumn` for a field not in the schema,
    /// `SchemaMismatch` for a value of the wrong type
    pub fn compile(schema: &Schema, criteria: &[Criterion]) -> Result<Self> {
        let mut terms = Vec::with_capacity(criteria.len());
        for c in criteria {
            let pos = schema
                .position(&c.field)
                .ok_or_else(|| DbError::UnknownColumn(c.field.clone()))?;
            let declared = schema.fields()[pos].field_type;
            if c.value.field_type() != declared {
                return Err(DbError::SchemaMismatch(format!(
                    "criterion on '{}' compares {} with {}",
                    c.field,
                    declared,
                    c.value.field_type()
                )));
            }
            if !c.value.is_storable() {
                return Err(DbError::SchemaMismatch(format!(
                    "criterion on '{}' compares with unstorable {:?}",
                    c.field, c.value
                )));
            }
            terms.push((pos, c.op, c.value.clone()));
        }
        Ok(Self { terms })
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.terms
            .iter()
            .all(|(pos, op, value)| row.get(*pos).map(|v| op.holds(v, value)).unwrap_or(false))
    }
}
