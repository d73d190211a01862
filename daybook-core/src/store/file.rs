use std::path::{Path, PathBuf};

use crate::error::{DaybookError, DaybookResult};
use crate::store::KeyValueStore;

/// One JSON file per key inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> DaybookResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            DaybookError::Storage(format!("Could not create data directory {}: {e}", dir.display()))
        })?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe_key = key.replace(['/', '\\', ':'], "_");
        self.dir.join(format!("{}.json", safe_key))
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> DaybookResult<Option<serde_json::Value>> {
        let path = self.path_for(key);

        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        let value = serde_json::from_str(&contents).map_err(|e| {
            DaybookError::Serialization(format!("Failed to parse {}: {e}", path.display()))
        })?;

        Ok(Some(value))
    }

    fn set_raw(&self, key: &str, value: serde_json::Value) -> DaybookResult<()> {
        let path = self.path_for(key);
        let contents = serde_json::to_string_pretty(&value)?;

        // Write to a sibling temp file first so a crash never leaves half a document.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> DaybookResult<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data")).unwrap();

        assert_eq!(store.get_raw("tasks").unwrap(), None);

        store.set_raw("tasks", json!([{"id": "a"}])).unwrap();
        assert_eq!(store.get_raw("tasks").unwrap(), Some(json!([{"id": "a"}])));
        assert!(store.dir().join("tasks.json").exists());

        store.remove("tasks").unwrap();
        store.remove("tasks").unwrap();
        assert_eq!(store.get_raw("tasks").unwrap(), None);
    }

    #[test]
    fn test_key_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set_raw("a/b:c", json!(1)).unwrap();
        assert!(dir.path().join("a_b_c.json").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("tasks.json"), "{nope").unwrap();
        assert!(store.get_raw("tasks").is_err());
    }
}
