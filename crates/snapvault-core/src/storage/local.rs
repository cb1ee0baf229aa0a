use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, VaultError};
use crate::storage::StorageBackend;

/// Storage backend for the local filesystem using `std::fs` directly.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at the given directory. The directory is
    /// created if it does not exist yet.
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        // Canonicalize for correct strip_prefix behavior with symlinked roots.
        let root = fs::canonicalize(root)?;
        Ok(Self { root })
    }

    /// Reject storage keys that could escape the repository root.
    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(VaultError::InvalidFormat("unsafe storage key: empty".into()));
        }
        if key.starts_with('/') || key.contains('\\') {
            return Err(VaultError::InvalidFormat(format!(
                "unsafe storage key: '{key}'"
            )));
        }
        for component in Path::new(key).components() {
            if component == Component::ParentDir {
                return Err(VaultError::InvalidFormat(format!(
                    "unsafe storage key: parent traversal '{key}'"
                )));
            }
        }
        Ok(())
    }

    /// Resolve a `/`-separated storage key to a filesystem path under the root.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Write to a temp file in the same directory, then rename into place,
    /// so readers never observe a partial object.
    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.root);
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Recursively collect file keys under `dir`, relative to the root.
    fn list_recursive(&self, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.list_recursive(&entry.path(), keys)?;
            } else if file_type.is_file() {
                if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(key);
                }
            }
        }
        Ok(())
    }
}

impl StorageBackend for LocalBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        match self.atomic_write(&path, data) {
            Err(VaultError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                self.atomic_write(&path, data)
            }
            other => other,
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn size(&self, key: &str) -> Result<Option<u64>> {
        let path = self.resolve(key)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.resolve(prefix.trim_end_matches('/'))?
        };
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {
                let mut keys = Vec::new();
                self.list_recursive(&dir, &mut keys)?;
                Ok(keys)
            }
            Ok(_) => Ok(Vec::new()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
