//! Catalog
//!
//! Registry of table schemas, key fields and page counts, keyed by table
//! name and persisted as one image.
//!
//! ## Persisted Form
//! ```text
//! {
//!   "students": {
//!     "name": "students",
//!     "fields": [["id", "integer"], ["name", "text"]],
//!     "key_field_name": "id",
//!     "page_count": 2,
//!     "capacity": 38
//!   }
//! }
//! ```
//! An unrecognized type tag is a fatal load error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DbError, Result};
use crate::persist::Persist;
use crate::schema::Schema;
use crate::types::Field;

/// Persisted image of the catalog
pub type CatalogImage = BTreeMap<String, CatalogEntry>;

/// One table's catalog record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub fields: Vec<(String, String)>,
    pub key_field_name: String,
    pub page_count: u32,
    pub capacity: usize,
}

/// In-memory metadata of one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    pub name: String,
    pub schema: Schema,
    pub page_count: u32,
    pub capacity: usize,
}

impl TableMeta {
    fn from_entry(entry: CatalogEntry) -> Result<Self> {
        let fields = entry
            .fields
            .into_iter()
            .map(|(name, tag)| Ok(Field::new(name, tag.parse()?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            schema: Schema::new(fields, entry.key_field_name)?,
            name: entry.name,
            page_count: entry.page_count,
            capacity: entry.capacity,
        })
    }

    fn to_entry(&self) -> CatalogEntry {
        CatalogEntry {
            name: self.name.clone(),
            fields: self
                .schema
                .fields()
                .iter()
                .map(|f| (f.name.clone(), f.field_type.as_str().to_string()))
                .collect(),
            key_field_name: self.schema.key_field().to_string(),
            page_count: self.page_count,
            capacity: self.capacity,
        }
    }
}

/// The table registry, owned by a [`crate::Database`]
pub struct Catalog {
    tables: BTreeMap<String, TableMeta>,
    store: Box<dyn Persist<CatalogImage>>,
}

impl Catalog {
    /// Load the catalog, creating and persisting an empty one if none exists
    pub fn open(store: Box<dyn Persist<CatalogImage>>) -> Result<Self> {
        let tables = match store.load()? {
            Some(image) => image
                .into_iter()
                .map(|(name, entry)| Ok((name, TableMeta::from_entry(entry)?)))
                .collect::<Result<BTreeMap<_, _>>>()?,
            None => {
                store.store(&CatalogImage::new())?;
                BTreeMap::new()
            }
        };

        Ok(Self { tables, store })
    }

    /// Register a new table; fails `TableExists` on a name collision
    pub fn create(&mut self, meta: TableMeta) -> Result<()> {
        if self.tables.contains_key(&meta.name) {
            return Err(DbError::TableExists(meta.name));
        }
        self.tables.insert(meta.name.clone(), meta);
        self.flush()
    }

    /// Metadata of `name`; fails `TableNotFound`
    pub fn get(&self, name: &str) -> Result<&TableMeta> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    /// Unregister a table; fails `TableNotFound`
    pub fn remove(&mut self, name: &str) -> Result<TableMeta> {
        let meta = self
            .tables
            .remove(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        self.flush()?;
        Ok(meta)
    }

    /// Record a table's page count, persisting only on change
    pub fn set_page_count(&mut self, name: &str, page_count: u32) -> Result<()> {
        let meta = self
            .tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        if meta.page_count == page_count {
            return Ok(());
        }
        debug!(table = name, from = meta.page_count, to = page_count, "page count changed");
        meta.page_count = page_count;
        self.flush()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn flush(&self) -> Result<()> {
        let image: CatalogImage = self
            .tables
            .iter()
            .map(|(name, meta)| (name.clone(), meta.to_entry()))
            .collect();
        self.store.store(&image)
    }
}
