//! Persistence seam
//!
//! The catalog and the key index are both persisted by rewriting a whole
//! image on every mutation. They reach storage only through [`Persist`], so
//! the write strategy can change without touching engine logic.

use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Load/store a complete image of `T`
pub trait Persist<T> {
    /// `Ok(None)` when nothing has been stored yet
    fn load(&self) -> Result<Option<T>>;

    /// Replace the stored image
    fn store(&self, value: &T) -> Result<()>;

    /// Forget the stored image (no-op when absent)
    fn remove(&self) -> Result<()>;
}

// =============================================================================
// JSON File
// =============================================================================

/// Full-file JSON rewrite. Not crash-atomic: a failure mid-write leaves a
/// truncated file behind.
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize + DeserializeOwned> Persist<T> for JsonFile<T> {
    fn load(&self) -> Result<Option<T>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(value))
    }

    fn store(&self, value: &T) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// In-Memory
// =============================================================================

/// Keeps the image in memory; counts stores so callers can observe flushes
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    image: RefCell<Option<T>>,
    stores: RefCell<usize>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            image: RefCell::new(None),
            stores: RefCell::new(0),
        }
    }

    /// Number of `store` calls so far
    pub fn store_count(&self) -> usize {
        *self.stores.borrow()
    }
}

impl<T: Clone> Persist<T> for MemoryStore<T> {
    fn load(&self) -> Result<Option<T>> {
        Ok(self.image.borrow().clone())
    }

    fn store(&self, value: &T) -> Result<()> {
        *self.image.borrow_mut() = Some(value.clone());
        *self.stores.borrow_mut() += 1;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.image.borrow_mut() = None;
        Ok(())
    }
}

impl<T, P: Persist<T>> Persist<T> for Rc<P> {
    fn load(&self) -> Result<Option<T>> {
        (**self).load()
    }

    fn store(&self, value: &T) -> Result<()> {
        (**self).store(value)
    }

    fn remove(&self) -> Result<()> {
        (**self).remove()
    }
}
