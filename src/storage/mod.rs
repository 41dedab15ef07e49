// Storage module: persistence backends for the mapping store.

pub mod json;
pub mod sqlite;

pub use json::JsonDocumentStorage;
pub use sqlite::SqliteStorage;

use crate::model::{MappingEntry, StorageError};

/// Backing persistence of the mapping store.
///
/// `load` returns entries in insertion order. `save` replaces the persisted
/// mapping with `entries` as a whole; a concurrent `load` must never observe a
/// partial write.
pub trait MappingPersistence {
    fn load(&self) -> Result<Vec<MappingEntry>, StorageError>;
    fn save(&mut self, entries: &[MappingEntry]) -> Result<(), StorageError>;
}

impl<P: MappingPersistence + ?Sized> MappingPersistence for Box<P> {
    fn load(&self) -> Result<Vec<MappingEntry>, StorageError> {
        (**self).load()
    }

    fn save(&mut self, entries: &[MappingEntry]) -> Result<(), StorageError> {
        (**self).save(entries)
    }
}
