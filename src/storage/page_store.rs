//! Page Store
//!
//! Holds the ordered, bounded-capacity pages of one table.
//!
//! ## Invariants
//! - Pages are numbered from 1; page files exist for exactly 1..=page_count
//! - Every page but the last holds exactly `capacity` rows
//! - The last page is never left empty: popping its final row deletes it

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DbError, Result};
use crate::schema::Row;
use crate::types::{FieldType, Value};

use super::row::{decode_rows, encode_row, encode_rows};
use super::Location;

/// Paged row storage for a single table
pub struct PageStore {
    /// Directory holding the page files
    dir: PathBuf,

    /// Table name (page file prefix)
    table: String,

    /// Column types in declared order, used to cast stored text
    types: Vec<FieldType>,

    /// Rows per page, fixed for the table's lifetime; at most u32::MAX so
    /// every offset fits a `Location`
    capacity: usize,

    /// Number of allocated pages
    page_count: u32,

    /// Rows currently on the last page (0 iff page_count == 0), <= capacity
    last_len: usize,
}

impl PageStore {
    /// Open the pages of a table
    ///
    /// Reads the last page once to learn its length; afterwards `count()`
    /// is answered from memory.
    pub fn open(
        dir: &Path,
        table: &str,
        types: Vec<FieldType>,
        capacity: usize,
        page_count: u32,
    ) -> Result<Self> {
        if capacity == 0 || u32::try_from(capacity).is_err() {
            return Err(DbError::InvalidArgument(format!(
                "page capacity must be between 1 and {}, got {}",
                u32::MAX,
                capacity
            )));
        }

        let mut store = Self {
            dir: dir.to_path_buf(),
            table: table.to_string(),
            types,
            capacity,
            page_count,
            last_len: 0,
        };

        if page_count > 0 {
            store.last_len = store.read_page(page_count)?.len();
            if store.last_len == 0 || store.last_len > capacity {
                return Err(DbError::Corruption(format!(
                    "last page {} of '{}' holds {} rows, capacity {}",
                    page_count, table, store.last_len, capacity
                )));
            }
        }

        Ok(store)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Number of live rows: (page_count - 1) * capacity + |last page|
    pub fn count(&self) -> usize {
        if self.page_count == 0 {
            return 0;
        }
        (self.page_count as usize - 1) * self.capacity + self.last_len
    }

    /// Location of the physically last row
    pub fn last_location(&self) -> Option<Location> {
        if self.page_count == 0 || self.last_len == 0 {
            return None;
        }
        Some(Location::new(self.page_count, self.last_len as u32 - 1))
    }

    /// File path for page `n`
    pub fn page_path(&self, n: u32) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", self.table, n))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append a row after the last one, allocating a page when the current
    /// last page is full (or none exists yet)
    pub fn append(&mut self, row: &[Value]) -> Result<()> {
        let allocate = self.count() % self.capacity == 0;
        let target = if allocate {
            self.page_count + 1
        } else {
            self.page_count
        };

        let mut file = if allocate {
            File::create(self.page_path(target))?
        } else {
            OpenOptions::new().append(true).open(self.page_path(target))?
        };
        file.write_all(encode_row(row).as_bytes())?;

        // Counters move only once the row is on disk
        if allocate {
            self.page_count = target;
            self.last_len = 1;
            debug!(table = %self.table, page = target, "allocated page");
        } else {
            self.last_len += 1;
        }

        Ok(())
    }

    /// Pop the last row of the last page, deleting the page if it empties
    pub fn remove_last(&mut self) -> Result<Row> {
        if self.page_count == 0 {
            return Err(DbError::Corruption(format!(
                "table '{}' has no rows to remove",
                self.table
            )));
        }

        let mut rows = self.read_page(self.page_count)?;
        let last = rows.pop().ok_or_else(|| {
            DbError::Corruption(format!(
                "last page {} of '{}' is empty",
                self.page_count, self.table
            ))
        })?;

        if rows.is_empty() {
            fs::remove_file(self.page_path(self.page_count))?;
            debug!(table = %self.table, page = self.page_count, "removed empty page");
            self.page_count -= 1;
            self.last_len = if self.page_count > 0 { self.capacity } else { 0 };
        } else {
            self.write_page(self.page_count, &rows)?;
            self.last_len = rows.len();
        }

        Ok(last)
    }

    /// Replace the full contents of page `n`
    pub fn write_page(&self, n: u32, rows: &[Row]) -> Result<()> {
        self.check_page(n)?;
        fs::write(self.page_path(n), encode_rows(rows))?;
        Ok(())
    }

    /// Overwrite the row at `loc`: read its page, patch, rewrite in full
    pub fn write_row(&self, loc: Location, row: Row) -> Result<()> {
        let mut rows = self.read_page(loc.page)?;
        let slot = rows
            .get_mut(loc.offset as usize)
            .ok_or_else(|| self.missing_slot(loc))?;
        *slot = row;
        self.write_page(loc.page, &rows)
    }

    /// Delete every page file
    pub fn destroy(self) -> Result<()> {
        for n in 1..=self.page_count {
            fs::remove_file(self.page_path(n))?;
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Typed rows of page `n`
    pub fn read_page(&self, n: u32) -> Result<Vec<Row>> {
        self.check_page(n)?;
        let content = fs::read_to_string(self.page_path(n))?;
        decode_rows(&content, &self.types)
    }

    /// The single row at `loc`
    pub fn read_row(&self, loc: Location) -> Result<Row> {
        let mut rows = self.read_page(loc.page)?;
        if (loc.offset as usize) >= rows.len() {
            return Err(self.missing_slot(loc));
        }
        Ok(rows.swap_remove(loc.offset as usize))
    }

    /// Iterate pages in order as (page number, rows)
    pub fn pages(&self) -> PageIter<'_> {
        PageIter {
            store: self,
            next: 1,
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_page(&self, n: u32) -> Result<()> {
        if n == 0 || n > self.page_count {
            return Err(DbError::Corruption(format!(
                "page {} of '{}' out of range (page count {})",
                n, self.table, self.page_count
            )));
        }
        Ok(())
    }

    fn missing_slot(&self, loc: Location) -> DbError {
        DbError::Corruption(format!(
            "no row at page {} offset {} of '{}'",
            loc.page, loc.offset, self.table
        ))
    }
}

/// Iterator over a table's pages in physical order
pub struct PageIter<'a> {
    store: &'a PageStore,
    next: u32,
}

impl<'a> Iterator for PageIter<'a> {
    type Item = Result<(u32, Vec<Row>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.store.page_count {
            return None;
        }
        let n = self.next;
        self.next += 1;
        Some(self.store.read_page(n).map(|rows| (n, rows)))
    }
}
