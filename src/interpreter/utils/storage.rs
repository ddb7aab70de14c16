//! Persistent storage for save files
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

/// Named byte blobs. `read` returns `Ok(None)` for a name that was never written.
pub trait SaveStorage {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), String>;
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, String>;
}

/// Save files in a directory, with a default extension appended to bare names
pub struct FileStorage {
    directory: PathBuf,
    extension: String,
}

impl FileStorage {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        FileStorage {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.directory.join(name);
        if path.extension().is_none() && !self.extension.is_empty() {
            path.set_extension(&self.extension);
        }
        path
    }
}

impl SaveStorage for FileStorage {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), String> {
        let path = self.path_for(name);
        debug!("Writing {} bytes to {}", data.len(), path.display());
        fs::write(&path, data).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }

    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, String> {
        let path = self.path_for(name);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
        }
    }
}

/// In-memory storage; clones share the same files
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.borrow().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(name).cloned()
    }

    pub fn insert(&self, name: &str, data: Vec<u8>) {
        self.files.borrow_mut().insert(name.to_string(), data);
    }
}

impl SaveStorage for MemoryStorage {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), String> {
        self.insert(name, data.to_vec());
        Ok(())
    }

    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, String> {
        Ok(self.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn memory_storage_clones_share_files() {
        let mut a = MemoryStorage::new();
        let mut b = a.clone();
        a.write("slot", &[1, 2, 3]).unwrap();
        assert_eq!(b.read("slot").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(b.read("other").unwrap(), None);
    }

    #[test]
    fn file_storage_appends_extension() {
        let dir = std::env::temp_dir().join(format!("alanvm-storage-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut storage = FileStorage::new(&dir, "sav");
        storage.write("game", b"data").unwrap();
        assert!(dir.join("game.sav").exists());
        assert_eq!(storage.read("game").unwrap(), Some(b"data".to_vec()));
        assert_eq!(storage.read("missing").unwrap(), None);
        fs::remove_dir_all(&dir).unwrap();
    }
}
