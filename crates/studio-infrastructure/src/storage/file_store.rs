//! Directory-backed key-value store.
//!
//! Each key lives in `<dir>/<key>.json`. Writes go through a temporary file,
//! `fsync` and an atomic rename while an exclusive lock on `<dir>/.store.lock`
//! is held, so a crash never leaves a half-written value behind.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as IoWrite};
use std::path::{Path, PathBuf};

use super::kv::{KeyValueStore, StoreError};

const VALUE_EXTENSION: &str = "json";
const LOCK_FILE: &str = ".store.lock";

/// A key-value store persisted as one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStore {
    /// Creates a store rooted at `dir` without a size limit.
    ///
    /// The directory is created lazily on first write.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            quota_bytes: None,
        }
    }

    /// Creates a store that rejects writes once the directory would exceed
    /// `quota_bytes` of stored values.
    pub fn with_quota(dir: PathBuf, quota_bytes: u64) -> Self {
        Self {
            dir,
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }

    /// Total bytes of stored values, skipping `exclude`.
    fn used_bytes(&self, exclude: &Path) -> Result<u64, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        for entry in entries {
            let path = entry?.path();
            if path == exclude {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            total += fs::metadata(&path)?.len();
        }
        Ok(total)
    }

    fn write_atomic(&self, path: &Path, value: &str) -> std::io::Result<()> {
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        let tmp_path = self.dir.join(format!(".{}.tmp", file_name));

        let written = File::create(&tmp_path).and_then(|mut tmp_file| {
            tmp_file.write_all(value.as_bytes())?;
            tmp_file.sync_all()
        });
        let result = written.and_then(|()| fs::rename(&tmp_path, path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }
}

/// A full disk is reported as a quota failure so callers can shrink and retry.
fn write_failure(key: &str, required: u64, limit: Option<u64>, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::StorageFull {
        tracing::warn!("[FileStore] Disk full while writing '{}'", key);
        StoreError::QuotaExceeded {
            key: key.to_string(),
            required,
            limit: limit.unwrap_or(required),
        }
    } else {
        err.into()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.value_path(key)?;
        fs::create_dir_all(&self.dir)?;
        let _lock = DirLock::acquire(&self.dir)?;

        if let Some(limit) = self.quota_bytes {
            let required = self.used_bytes(&path)? + value.len() as u64;
            if required > limit {
                tracing::debug!(
                    "[FileStore] Rejecting '{}': {} bytes > quota {}",
                    key,
                    required,
                    limit
                );
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    limit,
                });
            }
        }

        self.write_atomic(&path, value)
            .map_err(|e| write_failure(key, value.len() as u64, self.quota_bytes, e))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.value_path(key)?;
        if !self.dir.exists() {
            return Ok(());
        }
        let _lock = DirLock::acquire(&self.dir)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Exclusive lock on the store directory, released on drop.
struct DirLock {
    #[allow(dead_code)]
    file: File,
}

impl DirLock {
    fn acquire(dir: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        use fs2::FileExt;
        file.lock_exclusive()
            .map_err(|e| StoreError::LockError(format!("Failed to acquire lock: {}", e)))?;

        Ok(DirLock { file })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        use fs2::FileExt;
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("store"));

        assert!(store.get("ai-style-studio-history").unwrap().is_none());
        store.set("ai-style-studio-history", "[1,2,3]").unwrap();
        assert_eq!(
            store.get("ai-style-studio-history").unwrap().as_deref(),
            Some("[1,2,3]")
        );
        assert!(temp_dir
            .path()
            .join("store/ai-style-studio-history.json")
            .exists());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf());

        store.set("key", "first").unwrap();
        store.set("key", "second").unwrap();

        assert_eq!(store.get("key").unwrap().as_deref(), Some("second"));
        assert!(!temp_dir.path().join(".key.json.tmp").exists());
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf());

        // A non-empty directory in place of the value file makes the rename fail.
        let blocker = temp_dir.path().join("key.json");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("inner"), "x").unwrap();

        let err = store.set("key", "value").unwrap_err();
        assert!(matches!(err, StoreError::IoError(_)));
        assert!(!temp_dir.path().join(".key.json.tmp").exists());
    }

    #[test]
    fn test_full_disk_is_quota_exceeded() {
        let full = std::io::Error::from(ErrorKind::StorageFull);
        let err = write_failure("key", 42, Some(100), full);
        assert!(err.is_quota_exceeded());

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(!write_failure("key", 42, None, denied).is_quota_exceeded());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("absent"));
        store.remove("nothing").unwrap();

        let store = FileStore::new(temp_dir.path().to_path_buf());
        store.set("key", "v").unwrap();
        store.remove("key").unwrap();
        store.remove("key").unwrap();
        assert!(store.get("key").unwrap().is_none());
    }

    #[test]
    fn test_quota_excludes_replaced_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_quota(temp_dir.path().to_path_buf(), 10);

        store.set("a", "123456").unwrap();
        store.set("a", "1234567890").unwrap();

        let err = store.set("b", "x").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1234567890"));
        assert!(store.get("b").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf());

        for key in ["", "../escape", ".hidden", "a/b"] {
            assert!(matches!(
                store.set(key, "v"),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }
}
