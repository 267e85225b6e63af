//! Database Module
//!
//! Owns the catalog and hands out open tables.
//!
//! ## Responsibilities
//! - Create, open and drop tables
//! - Size new tables' pages from the configured byte budget
//! - Multi-table queries: per-table scans composed by an equi-join

use std::fs;
use std::path::Path;

use tracing::info;

use crate::catalog::{Catalog, CatalogImage, TableMeta};
use crate::config::Config;
use crate::error::{DbError, Result};
use crate::persist::JsonFile;
use crate::query::{equi_join, Criterion};
use crate::schema::Schema;
use crate::table::Table;
use crate::types::{Field, Record};

/// A directory of paged tables described by one catalog
pub struct Database {
    /// Database configuration
    config: Config,

    /// Table registry; tables borrow it to record page count changes
    catalog: Catalog,
}

impl Database {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const CATALOG_FILENAME: &'static str = "metadata.json";

    /// Open or create a database with the given config
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let catalog_file = JsonFile::<CatalogImage>::new(config.data_dir.join(Self::CATALOG_FILENAME));
        let catalog = Catalog::open(Box::new(catalog_file))?;

        info!(
            data_dir = %config.data_dir.display(),
            tables = catalog.len(),
            "database opened"
        );

        Ok(Self { config, catalog })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.data_dir = path.to_path_buf();
        Self::open(config)
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Create an empty table and return it open
    ///
    /// Page capacity is fixed here from the configured byte budget.
    pub fn create_table(
        &mut self,
        name: &str,
        fields: Vec<Field>,
        key_field: &str,
    ) -> Result<Table<'_>> {
        validate_table_name(name)?;
        if self.catalog.contains(name) {
            return Err(DbError::TableExists(name.to_string()));
        }

        let schema = Schema::new(fields, key_field)?;
        let capacity = schema.capacity(self.config.page_budget_bytes);

        self.catalog.create(TableMeta {
            name: name.to_string(),
            schema,
            page_count: 0,
            capacity,
        })?;
        info!(table = name, capacity, "created table");

        Table::open(&self.config.data_dir, &mut self.catalog, name)
    }

    /// Open an existing table; fails `TableNotFound`
    pub fn table(&mut self, name: &str) -> Result<Table<'_>> {
        Table::open(&self.config.data_dir, &mut self.catalog, name)
    }

    /// Delete a table's pages, key index and catalog entry
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.table(name)?.destroy()?;
        info!(table = name, "dropped table");
        Ok(())
    }

    pub fn num_tables(&self) -> usize {
        self.catalog.len()
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> Vec<String> {
        self.catalog.names()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Scan each table with its own criteria, then equi-join the results on
    /// `join_fields`, with `tables[0]` as the base table
    pub fn query_multiple_tables(
        &mut self,
        tables: &[&str],
        criteria: &[Vec<Criterion>],
        join_fields: &[&str],
    ) -> Result<Vec<Record>> {
        if tables.len() != criteria.len() {
            return Err(DbError::InvalidArgument(format!(
                "{} tables but {} criteria lists",
                tables.len(),
                criteria.len()
            )));
        }

        let mut row_sets = Vec::with_capacity(tables.len());
        for (name, table_criteria) in tables.iter().zip(criteria) {
            let table = self.table(name)?;
            for field in join_fields {
                table.schema().field(field)?;
            }
            row_sets.push(table.scan(table_criteria)?);
        }

        let join_fields: Vec<String> = join_fields.iter().map(|f| f.to_string()).collect();
        equi_join(&row_sets, &join_fields)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }
}

/// Table names become file name prefixes
fn validate_table_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(DbError::InvalidArgument(format!(
            "table name '{}' must be non-empty and use only letters, digits, '_' or '-'",
            name
        )));
    }
    Ok(())
}
