//! Storage Module
//!
//! Paged, file-backed row storage.
//!
//! ## Responsibilities
//! - Split a table's rows across bounded-capacity pages
//! - Allocate pages lazily on append, drop a page the moment it empties
//! - Full-page rewrites for every in-place change
//!
//! ## File Format
//! ```text
//! {data_dir}/{table}_{n}.csv        one file per page, n = 1..=page_count
//! ┌────────────────────────────────────────┐
//! │ value,value,"quoted, value",...\n      │  row at offset 0
//! │ value,value,"",...\n                   │  row at offset 1
//! │ ...                                    │  at most `capacity` rows
//! └────────────────────────────────────────┘
//! ```
//! Values are text in declared field order; timestamps use
//! `YYYY-MM-DD HH:MM:SS`.

mod page_store;
pub mod row;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use page_store::{PageIter, PageStore};

/// Physical position of a row: 1-based page number, 0-based offset in page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Location {
    pub page: u32,
    pub offset: u32,
}

impl Location {
    pub fn new(page: u32, offset: u32) -> Self {
        Self { page, offset }
    }
}

impl From<[u32; 2]> for Location {
    fn from([page, offset]: [u32; 2]) -> Self {
        Self { page, offset }
    }
}

impl From<Location> for [u32; 2] {
    fn from(loc: Location) -> Self {
        [loc.page, loc.offset]
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} offset {}", self.page, self.offset)
    }
}
