//! File-backed storage: one directory per namespace, one file per key.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tokio::runtime::{Handle, RuntimeFlavor};

use super::{KeyValueStore, StorageError};

/// Store persisted as `<dir>/<namespace>/<key>`.
///
/// All values are loaded on open. A write replaces only the file of the key
/// it touches, via a temporary file and rename, so a crash leaves either the
/// old or the new value and a cart update never rewrites a stored avatar.
/// Unreadable files open as absent.
///
/// Disk work runs through [`tokio::task::block_in_place`] when called on a
/// multi-threaded runtime, so other tasks move off the worker meanwhile.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store for `namespace` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidNamespace`] if `namespace` is empty or
    /// contains path separators, `..`, or control characters.
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> Result<Self, StorageError> {
        if !is_safe_name(namespace) {
            return Err(StorageError::InvalidNamespace(namespace.to_owned()));
        }
        let dir = dir.as_ref().join(namespace);
        let entries = off_worker(|| load_entries(&dir));

        Ok(Self {
            dir,
            entries: RwLock::new(entries),
        })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_name(key) {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|current| current == value) {
            return Ok(());
        }

        off_worker(|| write_atomic(&self.dir, &path, value.as_bytes()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(key) {
            return Ok(());
        }

        match off_worker(|| fs::remove_file(&path)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        entries.remove(key);
        Ok(())
    }
}

/// Delete the directory of `namespace` under `dir`. A missing one is fine.
pub(super) fn remove_namespace(dir: &Path, namespace: &str) -> Result<(), StorageError> {
    if !is_safe_name(namespace) {
        return Err(StorageError::InvalidNamespace(namespace.to_owned()));
    }
    match off_worker(|| fs::remove_dir_all(dir.join(namespace))) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn off_worker<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

fn load_entries(dir: &Path) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "storage directory unreadable");
            return entries;
        }
    };

    for entry in listing.flatten() {
        let Some(key) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        // Temporary files from interrupted writes start with a dot.
        if !is_safe_name(&key) || !entry.path().is_file() {
            continue;
        }
        match fs::read_to_string(entry.path()) {
            Ok(value) => {
                entries.insert(key, value);
            }
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "discarding unreadable storage value");
            }
        }
    }
    entries
}

fn write_atomic(dir: &Path, path: &Path, content: &[u8]) -> Result<(), StorageError> {
    fs::create_dir_all(dir)?;

    let tmp_path = dir.join(format!(
        ".{}.{}.tmp",
        path.file_name().and_then(|s| s.to_str()).unwrap_or("value"),
        uuid::Uuid::new_v4().simple()
    ));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    Ok(result?)
}

fn is_safe_name(name: &str) -> bool {
    !(name.trim().is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.chars().any(char::is_control))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn modified(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::open(dir.path(), "visitor-1").unwrap();
        store.set_item("cart", r#"[{"id":1}]"#).unwrap();
        store.set_item("userGender_u1", "female").unwrap();
        store.remove_item("userGender_u1").unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path(), "visitor-1").unwrap();
        assert_eq!(
            reopened.get_item("cart").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert_eq!(reopened.get_item("userGender_u1").unwrap(), None);
        assert!(dir.path().join("visitor-1").join("cart").is_file());
        assert!(!dir.path().join("visitor-1").join("userGender_u1").exists());
    }

    #[test]
    fn test_cart_write_leaves_avatar_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let avatar = format!("data:image/png;base64,{}", "A".repeat(64 * 1024));

        let store = FileStore::open(dir.path(), "v").unwrap();
        store.set_item("userAvatar_u1", &avatar).unwrap();
        let avatar_path = dir.path().join("v").join("userAvatar_u1");
        let written_at = modified(&avatar_path);

        std::thread::sleep(std::time::Duration::from_millis(20));
        for quantity in 1..=5 {
            store
                .set_item("cart", &format!(r#"[{{"id":1,"quantity":{quantity}}}]"#))
                .unwrap();
        }

        assert_eq!(modified(&avatar_path), written_at);
        assert!(fs::metadata(dir.path().join("v").join("cart")).unwrap().len() < 64);

        let reopened = FileStore::open(dir.path(), "v").unwrap();
        assert_eq!(reopened.get_item("userAvatar_u1").unwrap(), Some(avatar));
        assert_eq!(
            reopened.get_item("cart").unwrap().as_deref(),
            Some(r#"[{"id":1,"quantity":5}]"#)
        );
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileStore::open(dir.path(), "a").unwrap();
        let b = FileStore::open(dir.path(), "b").unwrap();

        a.set_item("cart", "[]").unwrap();
        assert_eq!(b.get_item("cart").unwrap(), None);
    }

    #[test]
    fn test_leftover_temp_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join("v");
        fs::create_dir_all(&ns).unwrap();
        fs::write(ns.join(".cart.abc.tmp"), "[partial").unwrap();
        fs::write(ns.join("cart"), "[]").unwrap();

        let store = FileStore::open(dir.path(), "v").unwrap();
        assert_eq!(store.get_item("cart").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get_item(".cart.abc.tmp").unwrap(), None);
    }

    #[test]
    fn test_creates_missing_directory_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("visitors");

        let store = FileStore::open(&nested, "v").unwrap();
        store.set_item("k", "v").unwrap();
        assert!(nested.join("v").join("k").exists());
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["", "  ", "a/b", "a\\b", "..", "x..y", "nul\0", ".hidden"] {
            assert!(
                matches!(
                    FileStore::open(dir.path(), bad),
                    Err(StorageError::InvalidNamespace(_))
                ),
                "{bad:?}"
            );
        }

        let store = FileStore::open(dir.path(), "v").unwrap();
        assert!(matches!(
            store.set_item("../cart", "[]"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_remove_namespace_deletes_values() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path(), "v")
            .unwrap()
            .set_item("cart", "[]")
            .unwrap();

        remove_namespace(dir.path(), "v").unwrap();
        remove_namespace(dir.path(), "v").unwrap();
        let reopened = FileStore::open(dir.path(), "v").unwrap();
        assert_eq!(reopened.get_item("cart").unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_writes_on_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), "v").unwrap();
        store.set_item("cart", "[]").unwrap();

        let reopened = FileStore::open(dir.path(), "v").unwrap();
        assert_eq!(reopened.get_item("cart").unwrap().as_deref(), Some("[]"));
    }
}
