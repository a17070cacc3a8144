//! Durable key-value storage for the session.
//!
//! The client keeps five string entries (see [`keys`]). Values are plain
//! strings; the cached player record is stored as encoded JSON text.
//!
//! Two implementations:
//! - [`MemoryStorage`]: a `HashMap` behind a mutex, for tests and
//!   throwaway sessions.
//! - [`FileStorage`]: a JSON object on disk, rewritten through a
//!   temporary file on every change.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::StorageError;

/// Storage keys used by the session.
pub mod keys {
    /// The bearer token.
    pub const TOKEN: &str = "token";
    /// The cached player record (encoded JSON).
    pub const PLAYER: &str = "player";
    pub const SAVED_EMAIL: &str = "saved_email";
    pub const SAVED_PASSWORD: &str = "saved_password";
    pub const SAVED_ROLE: &str = "saved_role";

    /// Written and cleared together.
    pub const SESSION: [&str; 2] = [TOKEN, PLAYER];

    /// The saved login used for automatic sign-in.
    pub const SAVED_LOGIN: [&str; 3] = [SAVED_EMAIL, SAVED_PASSWORD, SAVED_ROLE];

    /// Everything the client persists.
    pub const ALL: [&str; 5] = [TOKEN, PLAYER, SAVED_EMAIL, SAVED_PASSWORD, SAVED_ROLE];
}

/// Durable key-value storage.
///
/// Every operation is synchronous and atomic per call. The batch methods
/// have default implementations that loop over single-key calls;
/// implementations that can apply a batch in one step should override them.
pub trait Storage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Storage that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the given entries, e.g. a session left by an earlier run.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Storage backed by a JSON object in a file.
///
/// The whole map is loaded on [`open`](FileStorage::open) and kept in memory.
/// Each change rewrites the file: the new contents go to a sibling `.tmp`
/// file which is then renamed over the original, so a crash mid-write
/// leaves either the old or the new map. Batch calls write once.
///
/// The file holds the saved password in plain text. On Unix it is created
/// with mode `0600`.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens (or prepares to create) the store at `path`.
    ///
    /// A missing file is an empty store. So is an unreadable one: the
    /// contents are a cache of the backend's answers, and a warning is
    /// logged before the file is replaced on the next write.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the file exists but can't be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "session file is not a JSON object of strings, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened session file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the map and writes it. The copy only
    /// replaces the in-memory map once the file is written, so a failed
    /// write leaves both unchanged.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        let mut next = entries.clone();
        if change(&mut next) {
            self.write(&next)?;
            *entries = next;
        }
        Ok(())
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let bytes = serde_json::to_vec_pretty(entries).map_err(StorageError::Encode)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        write_private(&tmp, &bytes).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_many(&[key])
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|map| {
            let mut changed = false;
            for (key, value) in entries {
                if map.get(*key).map(String::as_str) != Some(*value) {
                    map.insert((*key).to_owned(), (*value).to_owned());
                    changed = true;
                }
            }
            changed
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|map| {
            let mut changed = false;
            for key in keys {
                changed |= map.remove(*key).is_some();
            }
            changed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        storage.set(keys::TOKEN, "abc").unwrap();

        assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some("abc"));

        storage.remove(keys::TOKEN).unwrap();
        storage.remove(keys::TOKEN).unwrap();
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_storage_batch_defaults() {
        let storage = MemoryStorage::with_entries([("other", "kept")]);
        storage
            .set_many(&[(keys::TOKEN, "t"), (keys::PLAYER, "{}")])
            .unwrap();
        assert_eq!(storage.len(), 3);

        storage.remove_many(&keys::ALL).unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get("other").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("session.json")).unwrap();

        assert!(storage.get(keys::TOKEN).unwrap().is_none());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_file_storage_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage
            .set_many(&[(keys::TOKEN, "tok"), (keys::SAVED_ROLE, "Don")])
            .unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).unwrap().as_deref(), Some("tok"));
        assert_eq!(reopened.get(keys::SAVED_ROLE).unwrap().as_deref(), Some("Don"));
        assert!(!dir.path().join("nested").join("session.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_remove_many_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set(keys::TOKEN, "tok").unwrap();
        storage.set(keys::SAVED_EMAIL, "a@b.c").unwrap();

        storage.remove_many(&keys::SESSION).unwrap();

        let on_disk: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[keys::SAVED_EMAIL], "a@b.c");
    }

    #[test]
    fn test_file_storage_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.get(keys::TOKEN).unwrap().is_none());

        storage.set(keys::TOKEN, "fresh").unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_file_storage_failed_write_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("session.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set(keys::SAVED_EMAIL, "old@b.c").unwrap();

        // A plain file where the directory should be.
        std::fs::remove_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub"), "").unwrap();

        let result = storage.set_many(&[(keys::TOKEN, "tok"), (keys::SAVED_EMAIL, "new@b.c")]);
        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
        assert_eq!(storage.get(keys::SAVED_EMAIL).unwrap().as_deref(), Some("old@b.c"));

        assert!(storage.remove(keys::SAVED_EMAIL).is_err());
        assert_eq!(storage.get(keys::SAVED_EMAIL).unwrap().as_deref(), Some("old@b.c"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set(keys::SAVED_PASSWORD, "secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
