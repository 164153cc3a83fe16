//! JSON document on disk, rewritten in full on every save.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use pixel_types::StoreRecord;
use tracing::warn;

use super::StoreBackend;
use crate::errors::StoreError;

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

impl StoreBackend for JsonFileBackend {
    /// A missing file is an empty store; anything unreadable is an error.
    fn load(&self) -> Result<StoreRecord, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.display(), "Store file not found, starting empty");
                return Ok(StoreRecord::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.display(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.display(),
            source,
        })
    }

    /// Written to a sibling temp file first, then renamed over the original.
    fn save(&self, record: &StoreRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        let write_err = |source| StoreError::Write {
            path: self.display(),
            source,
        };
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }

    fn describe(&self) -> String {
        self.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixel_types::Identity;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("config.json"));
        assert_eq!(backend.load().unwrap(), StoreRecord::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("config.json"));

        let mut record = StoreRecord::default();
        record.whitelist.insert(Identity::new("zlef"));
        record.shortcuts.insert("ore".into(), "Mining".into());
        backend.save(&record).unwrap();

        assert_eq!(backend.load().unwrap(), record);
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[test]
    fn test_saved_document_is_pretty_and_uses_wire_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        JsonFileBackend::new(&path).save(&StoreRecord::default()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("\"alttraderlist\""));
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileBackend::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_unwritable_directory_is_write_error() {
        let backend = JsonFileBackend::new("/nonexistent/dir/config.json");
        let err = backend.save(&StoreRecord::default()).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
