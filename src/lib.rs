//! # pagedb
//!
//! A minimal file-backed record store with:
//! - Typed-field tables (integer, text, timestamp) with a primary key
//! - Rows paginated across bounded-capacity page files
//! - A persisted primary-key index kept in step with physical row location
//! - Swap-with-last compaction on delete (no holes, no tombstones)
//! - Predicate scans and a multi-table equi-join
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Database                              │
//! │        (owns Catalog, multi-table query / equi-join)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Table Engine                            │
//! │          (CRUD, compaction, predicate scans)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Page Store  │          │  Key Index  │
//!   │ ({t}_{n}.csv)│         │ (JSON image)│
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! Single-threaded and synchronous. Every mutation rewrites the affected page
//! and index files in full; a failure mid-rewrite can leave them disagreeing.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod types;
pub mod schema;
pub mod persist;

pub mod catalog;
pub mod storage;
pub mod index;
pub mod query;
pub mod table;
pub mod database;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DbError, Result};
pub use config::Config;
pub use database::Database;
pub use query::{Criterion, Operator};
pub use table::Table;
pub use types::{Field, FieldType, Record, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pagedb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
