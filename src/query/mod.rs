//! Query Module
//!
//! Predicate evaluation and multi-table equi-joins.
//!
//! ## Responsibilities
//! - Selection criteria (`field <op> value`, AND-combined)
//! - Compile criteria against a schema for row scans
//! - Inner equi-join of independently filtered row sets

mod criterion;
mod join;

pub use criterion::{matches_all, Criterion, Operator, Predicate};
pub use join::equi_join;
