//! Atomic TOML documents.
//!
//! Writes go to a temporary sibling file, are fsynced, and then renamed over
//! the target while an exclusive lock is held, so a reader never observes a
//! half-written document.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during atomic TOML operations.
#[derive(Error, Debug)]
pub enum AtomicTomlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not valid TOML for the requested type.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Lock error: {0}")]
    Lock(String),
}

/// A handle to one TOML file on disk.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw document text.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: File exists and is not blank
    /// - `Ok(None)`: File doesn't exist or is blank
    pub fn read_raw(&self) -> Result<Option<String>, AtomicTomlError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    /// Loads and deserializes the file; a missing or blank file yields `None`.
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        match self.read_raw()? {
            Some(content) => Ok(Some(toml::from_str(&content)?)),
            None => Ok(None),
        }
    }

    /// Serializes `data` and replaces the file atomically under an exclusive lock.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        let toml_string = toml::to_string_pretty(data)?;
        let _lock = FileLock::acquire(&self.path)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Removes the file. A missing file is not an error.
    pub fn remove(&self) -> Result<(), AtomicTomlError> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> Result<PathBuf, AtomicTomlError> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Path has no parent directory")
        })?;
        let file_name = self.path.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Path has no file name")
        })?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive lock on `<file>.lock`, released on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicTomlError> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| AtomicTomlError::Lock(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Doc>::new(temp_dir.path().join("doc.toml"));

        let doc = Doc {
            name: "studio".to_string(),
            count: 42,
        };
        file.save(&doc).unwrap();

        assert_eq!(file.load().unwrap(), Some(doc));
    }

    #[test]
    fn test_missing_and_blank_files_load_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Doc>::new(temp_dir.path().join("doc.toml"));
        assert!(file.load().unwrap().is_none());

        fs::write(file.path(), "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_or_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.toml");
        let file = AtomicTomlFile::<Doc>::new(path.clone());
        file.save(&Doc {
            name: "a".to_string(),
            count: 1,
        })
        .unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join(".doc.toml.tmp").exists());
        assert!(!temp_dir.path().join("doc.lock").exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Doc>::new(temp_dir.path().join("doc.toml"));
        file.save(&Doc {
            name: "a".to_string(),
            count: 1,
        })
        .unwrap();

        file.remove().unwrap();
        file.remove().unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Doc>::new(temp_dir.path().join("doc.toml"));
        fs::write(file.path(), "name = ").unwrap();
        assert!(matches!(file.load(), Err(AtomicTomlError::Parse(_))));
    }
}
