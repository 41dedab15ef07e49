use crate::model::{MappingEntry, StorageError};
use crate::storage::MappingPersistence;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Field of the application state document that holds the mapping.
pub const MAPPINGS_FIELD: &str = "boothMappings";

/// Stores the mapping as one field of a larger JSON application state
/// document, leaving every other field untouched.
pub struct JsonDocumentStorage {
    path: PathBuf,
}

impl JsonDocumentStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the whole document; a missing file is an empty document.
    fn read_document(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(StorageError::MalformedDocument(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Writes to a sibling temp file, then renames it over the document.
    fn write_document(&self, doc: &Map<String, Value>) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl MappingPersistence for JsonDocumentStorage {
    fn load(&self) -> Result<Vec<MappingEntry>, StorageError> {
        let doc = self.read_document()?;
        let mappings = match doc.get(MAPPINGS_FIELD) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(m)) => m,
            Some(_) => {
                return Err(StorageError::MalformedDocument(format!(
                    "`{MAPPINGS_FIELD}` must be an object"
                )));
            }
        };

        let mut entries = Vec::with_capacity(mappings.len());
        for (key, value) in mappings {
            match value.as_str() {
                Some(url) => entries.push(MappingEntry {
                    key: key.clone(),
                    url: url.to_string(),
                    learned_at: None,
                }),
                None => warn!("Skipping non-string mapping for key '{}'", key),
            }
        }
        debug!("Loaded {} mappings from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    fn save(&mut self, entries: &[MappingEntry]) -> Result<(), StorageError> {
        let mut doc = self.read_document()?;
        let mappings: Map<String, Value> = entries
            .iter()
            .map(|e| (e.key.clone(), Value::String(e.url.clone())))
            .collect();
        doc.insert(MAPPINGS_FIELD.to_string(), Value::Object(mappings));
        self.write_document(&doc)?;
        debug!("Saved {} mappings to {}", entries.len(), self.path.display());
        Ok(())
    }
}
