//! Cache store - Read/write the cached dfixxer binary and its metadata

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cache::meta::{CacheMeta, META_FILE};
use crate::core::model::{HookError, HookResult};
use crate::core::paths::entry_dir;
use crate::core::util::set_executable;

/// Cache location for one release tag on one platform
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    entry: PathBuf,
    release_tag: String,
    binary_name: String,
}

impl CacheStore {
    /// Fails for release tags that would leave the cache root
    pub fn new(
        root: impl Into<PathBuf>,
        release_tag: &str,
        binary_name: &str,
    ) -> HookResult<Self> {
        let root = root.into();
        let entry = entry_dir(&root, release_tag)?;
        Ok(Self {
            root,
            entry,
            release_tag: release_tag.to_string(),
            binary_name: binary_name.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn release_tag(&self) -> &str {
        &self.release_tag
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Directory holding this tag's binary
    pub fn entry_dir(&self) -> PathBuf {
        self.entry.clone()
    }

    /// Path the binary lives at once cached
    pub fn binary_path(&self) -> PathBuf {
        self.entry_dir().join(&self.binary_name)
    }

    /// The cached binary, if present
    pub fn cached_binary(&self) -> Option<PathBuf> {
        let path = self.binary_path();
        path.is_file().then_some(path)
    }

    /// Ensure the entry directory exists
    pub fn ensure_entry_dir(&self) -> HookResult<PathBuf> {
        let dir = self.entry_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| HookError::io("failed to create cache directory", &dir, e))?;
        Ok(dir)
    }

    /// Create a temporary file inside the entry directory.
    ///
    /// Staging next to the final path keeps `install` a same-filesystem rename.
    pub fn staging_file(&self) -> HookResult<NamedTempFile> {
        let dir = self.ensure_entry_dir()?;
        tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(&dir)
            .map_err(|e| HookError::io("failed to create staging file", &dir, e))
    }

    /// Mark a staged file executable and move it into place
    pub fn install(&self, staged: NamedTempFile) -> HookResult<PathBuf> {
        let target = self.binary_path();
        set_executable(staged.path())
            .map_err(|e| HookError::io("failed to set executable bit", staged.path(), e))?;
        staged
            .persist(&target)
            .map_err(|e| HookError::io("failed to install binary", &target, e.error))?;
        debug!("Installed {}", target.display());
        Ok(target)
    }

    /// Write metadata next to the binary
    pub fn write_meta(&self, meta: &CacheMeta) -> HookResult<()> {
        let path = self.entry_dir().join(META_FILE);
        let json = serde_json::to_string_pretty(meta).map_err(|e| {
            HookError::io("failed to encode metadata", &path, std::io::Error::other(e))
        })?;
        fs::write(&path, json).map_err(|e| HookError::io("failed to write metadata", &path, e))
    }

    /// Read metadata; missing or malformed metadata yields `None`
    pub fn read_meta(&self) -> Option<CacheMeta> {
        let path = self.entry_dir().join(META_FILE);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!("Ignoring unreadable {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Remove this tag's entry; returns whether anything was removed
    pub fn clean(&self) -> HookResult<bool> {
        remove_cache_dir(&self.entry_dir())
    }
}

/// Remove a cache directory tree; returns whether anything was removed
pub fn remove_cache_dir(dir: &Path) -> HookResult<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir).map_err(|e| HookError::io("failed to remove cache directory", dir, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_binary_path_layout() {
        let store = CacheStore::new("/cache", "v0.9.2", "dfixxer").unwrap();
        assert_eq!(store.binary_path(), PathBuf::from("/cache/v0.9.2/dfixxer"));
    }

    #[test]
    fn test_cached_binary_absent() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        assert_eq!(store.cached_binary(), None);
    }

    #[test]
    fn test_install_moves_staged_file() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();

        let mut staged = store.staging_file().unwrap();
        staged.write_all(b"binary").unwrap();
        let installed = store.install(staged).unwrap();

        assert_eq!(installed, store.binary_path());
        assert_eq!(store.cached_binary(), Some(installed.clone()));
        assert_eq!(fs::read(&installed).unwrap(), b"binary");
        assert!(crate::core::util::is_executable(&installed));

        // Only the binary is left behind
        let names: Vec<_> = fs::read_dir(store.entry_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["dfixxer".to_string()]);
    }

    #[test]
    fn test_write_read_meta() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        store.ensure_entry_dir().unwrap();

        let meta = CacheMeta::new("v0.9.2", "dfixxer-linux-x86_64", "https://x", "abc123");
        store.write_meta(&meta).unwrap();

        assert_eq!(store.read_meta(), Some(meta));
    }

    #[test]
    fn test_read_meta_malformed() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let dir = store.ensure_entry_dir().unwrap();
        fs::write(dir.join(META_FILE), "{not json").unwrap();

        assert_eq!(store.read_meta(), None);
    }

    #[test]
    fn test_clean_entry_keeps_other_tags() {
        let temp = tempdir().unwrap();
        let current = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let old = CacheStore::new(temp.path(), "v0.9.1", "dfixxer").unwrap();
        current.ensure_entry_dir().unwrap();
        old.ensure_entry_dir().unwrap();

        assert!(current.clean().unwrap());
        assert!(!current.entry_dir().exists());
        assert!(old.entry_dir().exists());
        assert!(!current.clean().unwrap());
    }

    #[test]
    fn test_remove_cache_dir() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("cache");
        let store = CacheStore::new(&root, "v0.9.2", "dfixxer").unwrap();
        store.ensure_entry_dir().unwrap();

        assert!(remove_cache_dir(&root).unwrap());
        assert!(!root.exists());
        assert!(!remove_cache_dir(&root).unwrap());
    }

    #[test]
    fn test_parent_tag_is_rejected() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("cache");
        fs::create_dir_all(&root).unwrap();
        fs::write(temp.path().join("other-tool-data"), b"keep").unwrap();

        let err = CacheStore::new(&root, "..", "dfixxer").unwrap_err();
        assert!(matches!(err, HookError::InvalidReleaseTag(_)));
        assert!(temp.path().join("other-tool-data").exists());
    }
}
