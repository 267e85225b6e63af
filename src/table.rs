//! Table Engine
//!
//! CRUD and predicate scans over one table, keeping the page store, the key
//! index and the catalog's page count in step.
//!
//! ## Deletion: swap-with-last compaction
//! Deleting never leaves a hole. The physically last row is popped and, unless
//! it is the row being deleted, written into the vacated slot and re-indexed.
//! Pages therefore stay full except the last, and no empty page survives.
//!
//! Each mutation rewrites whole page files and the whole index image. These
//! steps are one logical unit but not crash-atomic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{DbError, Result};
use crate::index::{IndexImage, KeyIndex};
use crate::persist::JsonFile;
use crate::query::{Criterion, Predicate};
use crate::schema::{Row, Schema};
use crate::storage::{Location, PageStore};
use crate::types::{Record, Value};

/// An open table, borrowing the catalog it records its page count in
pub struct Table<'db> {
    name: String,
    dir: PathBuf,
    schema: Schema,
    pages: PageStore,
    index: KeyIndex,
    catalog: &'db mut Catalog,
}

impl<'db> Table<'db> {
    /// Open a catalogued table
    ///
    /// The persisted key index is used when its size agrees with the row
    /// count; otherwise it is rebuilt from a full page scan.
    pub(crate) fn open(dir: &Path, catalog: &'db mut Catalog, name: &str) -> Result<Self> {
        let meta = catalog.get(name)?.clone();
        let schema = meta.schema;

        let pages = PageStore::open(
            dir,
            name,
            schema.field_types(),
            meta.capacity,
            meta.page_count,
        )?;

        let index_file = JsonFile::<IndexImage>::new(index_path(dir, name));
        let index = match KeyIndex::load(schema.key_type(), Box::new(index_file.clone()))? {
            Some(index) if index.len() == pages.count() => index,
            Some(stale) => {
                warn!(
                    table = name,
                    indexed = stale.len(),
                    rows = pages.count(),
                    "key index out of date, rebuilding"
                );
                KeyIndex::rebuild(&schema, pages.pages(), Box::new(index_file))?
            }
            None => KeyIndex::rebuild(&schema, pages.pages(), Box::new(index_file))?,
        };

        Ok(Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            schema,
            pages,
            index,
            catalog,
        })
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Insert a full record
    ///
    /// Fails `SchemaMismatch` unless `values` covers exactly the declared
    /// fields with their types, `DuplicateKey` if the key is already present.
    pub fn insert(&mut self, values: Record) -> Result<()> {
        self.schema.check_full(&values)?;
        let row = self.schema.to_row(&values)?;
        let key = self.schema.key_of(&row)?.clone();

        if self.index.contains(&key) {
            return Err(DbError::DuplicateKey(key.to_string()));
        }

        self.pages.append(&row)?;
        self.sync_page_count()?;

        let loc = self
            .pages
            .last_location()
            .ok_or_else(|| DbError::Corruption("append left no last row".to_string()))?;
        self.index.insert(key, loc)
    }

    /// Fetch the record with primary key `key`
    pub fn get(&self, key: &Value) -> Result<Record> {
        let loc = self.index.lookup(key)?;
        let row = self.pages.read_row(loc)?;
        Ok(self.schema.to_record(row))
    }

    /// Overwrite the supplied fields of the record at `key`, in place
    ///
    /// The key field may only be supplied with its current value.
    pub fn update(&mut self, key: &Value, changes: Record) -> Result<()> {
        let loc = self.index.lookup(key)?;
        self.schema.check_partial(&changes)?;

        if let Some(new_key) = changes.get(self.schema.key_field()) {
            if new_key != key {
                return Err(DbError::SchemaMismatch(format!(
                    "key field '{}' cannot be changed",
                    self.schema.key_field()
                )));
            }
        }

        let mut rows = self.pages.read_page(loc.page)?;
        let row = rows.get_mut(loc.offset as usize).ok_or_else(|| {
            DbError::Corruption(format!("key {} indexed at empty slot {}", key, loc))
        })?;
        for (name, value) in changes {
            if let Some(pos) = self.schema.position(&name) {
                row[pos] = value;
            }
        }
        self.pages.write_page(loc.page, &rows)
    }

    /// Delete the record at `key` with swap-with-last compaction
    pub fn delete(&mut self, key: &Value) -> Result<()> {
        let loc = self.index.lookup(key)?;

        // Sole record: its page goes away with it
        if self.pages.count() == 1 {
            self.pages.remove_last()?;
            self.sync_page_count()?;
            self.index.remove(key)?;
            return Ok(());
        }

        let moved = self.pages.remove_last()?;
        self.sync_page_count()?;

        let moved_key = self.schema.key_of(&moved)?.clone();
        if &moved_key == key {
            self.index.remove(key)?;
            return Ok(());
        }

        self.pages.write_row(loc, moved)?;
        self.index.relocate(&moved_key, loc)?;
        self.index.remove(key)?;
        debug!(table = %self.name, deleted = %key, moved = %moved_key, to = %loc, "compacted");

        Ok(())
    }

    /// Delete every record matching `criteria`; returns how many were removed
    ///
    /// Matching keys are captured before the first deletion, since each
    /// deletion may relocate other rows.
    pub fn delete_matching(&mut self, criteria: &[Criterion]) -> Result<usize> {
        let keys = self
            .scan_rows(criteria)?
            .iter()
            .map(|row| self.schema.key_of(row).cloned())
            .collect::<Result<Vec<_>>>()?;

        for key in &keys {
            self.delete(key)?;
        }

        Ok(keys.len())
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// Records satisfying every criterion, in physical (page, offset) order
    ///
    /// Fails `UnknownColumn` if a criterion names a field not in the schema.
    pub fn scan(&self, criteria: &[Criterion]) -> Result<Vec<Record>> {
        Ok(self
            .scan_rows(criteria)?
            .into_iter()
            .map(|row| self.schema.to_record(row))
            .collect())
    }

    fn scan_rows(&self, criteria: &[Criterion]) -> Result<Vec<Row>> {
        let predicate = Predicate::compile(&self.schema, criteria)?;

        let mut matched = Vec::new();
        for page in self.pages.pages() {
            let (_, rows) = page?;
            matched.extend(rows.into_iter().filter(|row| predicate.matches(row)));
        }
        Ok(matched)
    }

    // =========================================================================
    // Index Maintenance
    // =========================================================================

    /// Where the record with `key` is stored
    pub fn location_of(&self, key: &Value) -> Result<Location> {
        self.index.lookup(key)
    }

    /// Live key → location entries
    pub fn index_entries(&self) -> &HashMap<Value, Location> {
        self.index.entries()
    }

    /// Replace the key index with one derived from a full page scan
    pub fn rebuild_index(&mut self) -> Result<()> {
        let store = Box::new(JsonFile::<IndexImage>::new(index_path(&self.dir, &self.name)));
        self.index = KeyIndex::rebuild(&self.schema, self.pages.pages(), store)?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn key_field(&self) -> &str {
        self.schema.key_field()
    }

    pub fn count(&self) -> usize {
        self.pages.count()
    }

    pub fn page_count(&self) -> u32 {
        self.pages.page_count()
    }

    pub fn capacity(&self) -> usize {
        self.pages.capacity()
    }

    /// Path of page `n`'s file
    pub fn page_path(&self, n: u32) -> PathBuf {
        self.pages.page_path(n)
    }

    /// Delete all pages, the index file and the catalog entry
    pub(crate) fn destroy(self) -> Result<()> {
        self.pages.destroy()?;
        self.index.destroy()?;
        self.catalog.remove(&self.name)?;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn sync_page_count(&mut self) -> Result<()> {
        self.catalog.set_page_count(&self.name, self.pages.page_count())
    }
}

/// File path of a table's key index
pub(crate) fn index_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}_key_index.json", table))
}
