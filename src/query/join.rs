//! Equi-join
//!
//! Combines independently filtered row sets of several tables into one
//! inner-joined result.
//!
//! ## Semantics
//! - The first row set is the base; every base row is matched against each
//!   other table, one table at a time, by equality on all join fields.
//! - A merged row is the base row plus the matched row's non-join fields, so
//!   join fields appear once. On a non-join name collision the later table
//!   wins.
//! - No match in some table drops the row; several matches fan it out into
//!   one merged row per match.

use crate::error::{DbError, Result};
use crate::types::Record;

use super::criterion::{matches_all, Criterion, Operator};

/// Inner equi-join of `row_sets` on `join_fields`
pub fn equi_join(row_sets: &[Vec<Record>], join_fields: &[String]) -> Result<Vec<Record>> {
    let (base, others) = row_sets
        .split_first()
        .ok_or_else(|| DbError::InvalidArgument("join needs at least one table".to_string()))?;

    let mut joined = Vec::new();
    for base_row in base {
        let on = join_criteria(base_row, join_fields)?;

        // Partial results grow one table at a time
        let mut partial = vec![base_row.clone()];
        for rows in others {
            let matches: Vec<&Record> = rows.iter().filter(|r| matches_all(r, &on)).collect();

            let mut next = Vec::with_capacity(partial.len() * matches.len());
            for acc in &partial {
                for m in &matches {
                    next.push(merge(acc, m, join_fields));
                }
            }
            partial = next;

            if partial.is_empty() {
                break;
            }
        }

        joined.extend(partial);
    }

    Ok(joined)
}

/// Equality criteria pinning every join field to the base row's value
fn join_criteria(base_row: &Record, join_fields: &[String]) -> Result<Vec<Criterion>> {
    join_fields
        .iter()
        .map(|field| {
            let value = base_row
                .get(field)
                .ok_or_else(|| DbError::UnknownColumn(field.clone()))?;
            Ok(Criterion::new(field.clone(), Operator::Eq, value.clone()))
        })
        .collect()
}

fn merge(acc: &Record, matched: &Record, join_fields: &[String]) -> Record {
    let mut merged = acc.clone();
    for (name, value) in matched {
        if !join_fields.contains(name) {
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}
