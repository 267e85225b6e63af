//! Key Index
//!
//! Primary-key value → physical row location, with O(1) lookups.
//!
//! Every mutation is flushed to the persisted image before returning, so a
//! reader of the image always sees the state after the last completed call.
//!
//! ## Persisted Form
//! ```text
//! { "<key as text>": [[page, offset]], ... }
//! ```

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use crate::error::{DbError, Result};
use crate::persist::Persist;
use crate::schema::{Row, Schema};
use crate::storage::Location;
use crate::types::{FieldType, Value};

/// Persisted image of a key index
pub type IndexImage = BTreeMap<String, Vec<Location>>;

/// Live key → location map of one table
pub struct KeyIndex {
    /// Declared type of the key field (to parse persisted keys)
    key_type: FieldType,

    /// One entry per live row
    entries: HashMap<Value, Location>,

    /// Where the image is flushed after every mutation
    store: Box<dyn Persist<IndexImage>>,
}

impl KeyIndex {
    /// An empty index; nothing is written until the first mutation or `flush`
    pub fn new(key_type: FieldType, store: Box<dyn Persist<IndexImage>>) -> Self {
        Self {
            key_type,
            entries: HashMap::new(),
            store,
        }
    }

    /// Load the persisted image, `Ok(None)` if none exists
    pub fn load(key_type: FieldType, store: Box<dyn Persist<IndexImage>>) -> Result<Option<Self>> {
        let image = match store.load()? {
            Some(image) => image,
            None => return Ok(None),
        };

        let mut entries = HashMap::with_capacity(image.len());
        for (text, locations) in image {
            let key = key_type.parse_value(&text).ok_or_else(|| {
                DbError::Corruption(format!("index key {:?} is not a valid {}", text, key_type))
            })?;
            let loc = match locations.as_slice() {
                [loc] => *loc,
                _ => {
                    return Err(DbError::Corruption(format!(
                        "index key {:?} has {} locations",
                        text,
                        locations.len()
                    )))
                }
            };
            entries.insert(key, loc);
        }

        Ok(Some(Self {
            key_type,
            entries,
            store,
        }))
    }

    /// Re-derive every entry from a full page scan and persist the result
    pub fn rebuild<I>(schema: &Schema, pages: I, store: Box<dyn Persist<IndexImage>>) -> Result<Self>
    where
        I: IntoIterator<Item = Result<(u32, Vec<Row>)>>,
    {
        let index = Self {
            key_type: schema.key_type(),
            entries: Self::scan(schema, pages)?,
            store,
        };
        index.flush()?;
        info!(entries = index.len(), "rebuilt key index");
        Ok(index)
    }

    /// Key → location pairs of every row, in a single pass over the pages
    pub fn scan<I>(schema: &Schema, pages: I) -> Result<HashMap<Value, Location>>
    where
        I: IntoIterator<Item = Result<(u32, Vec<Row>)>>,
    {
        let mut entries = HashMap::new();
        for page in pages {
            let (n, rows) = page?;
            for (offset, row) in rows.iter().enumerate() {
                let key = schema.key_of(row)?.clone();
                let offset = u32::try_from(offset).map_err(|_| {
                    DbError::Corruption(format!("page {} holds more rows than offsets can address", n))
                })?;
                let loc = Location::new(n, offset);
                if let Some(prev) = entries.insert(key, loc) {
                    return Err(DbError::DuplicateKey(format!(
                        "{} stored at both {} and {}",
                        schema.key_of(row)?,
                        prev,
                        loc
                    )));
                }
            }
        }
        Ok(entries)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add an entry; fails `DuplicateKey` if the key is already indexed
    pub fn insert(&mut self, key: Value, loc: Location) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(DbError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key, loc);
        self.flush()
    }

    /// Location of `key`; fails `KeyNotFound` if absent
    pub fn lookup(&self, key: &Value) -> Result<Location> {
        self.entries
            .get(key)
            .copied()
            .ok_or_else(|| DbError::KeyNotFound(key.to_string()))
    }

    /// Drop an entry; fails `KeyNotFound` if absent
    pub fn remove(&mut self, key: &Value) -> Result<Location> {
        let loc = self
            .entries
            .remove(key)
            .ok_or_else(|| DbError::KeyNotFound(key.to_string()))?;
        self.flush()?;
        Ok(loc)
    }

    /// Point an existing entry at a new location
    pub fn relocate(&mut self, key: &Value, loc: Location) -> Result<()> {
        let slot = self
            .entries
            .get_mut(key)
            .ok_or_else(|| DbError::KeyNotFound(key.to_string()))?;
        *slot = loc;
        self.flush()
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key_type(&self) -> FieldType {
        self.key_type
    }

    pub fn entries(&self) -> &HashMap<Value, Location> {
        &self.entries
    }

    /// Write the full image to the store
    pub fn flush(&self) -> Result<()> {
        let image: IndexImage = self
            .entries
            .iter()
            .map(|(key, loc)| (key.to_text(), vec![*loc]))
            .collect();
        self.store.store(&image)
    }

    /// Remove the persisted image
    pub fn destroy(self) -> Result<()> {
        self.store.remove()
    }
}
