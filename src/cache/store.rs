// src/cache/store.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::ChangeCache;
use crate::errors::Result;
use crate::fs::FileSystem;

/// Cache file location, relative to the build root.
pub const DEFAULT_CACHE_FILE: &str = "_build/cache/taskforge.filecache.json";

/// Reads and writes the change cache file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl CacheStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted cache, creating the storage location and an empty
    /// cache file if none exists yet.
    pub fn load_or_init(&self) -> Result<ChangeCache> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                self.fs.create_dir_all(parent)?;
            }
        }

        if !self.fs.exists(&self.path) {
            info!(path = ?self.path, "no change cache yet; starting empty");
            self.fs.write(&self.path, b"{}")?;
            return Ok(ChangeCache::new());
        }

        let contents = self.fs.read_to_string(&self.path)?;
        let cache: ChangeCache = serde_json::from_str(&contents)?;
        debug!(path = ?self.path, entries = cache.len(), "loaded change cache");
        Ok(cache)
    }

    /// Overwrite the cache file in full.
    ///
    /// The new contents go to a sibling temporary file which is then renamed
    /// over the target, so readers never observe a partial write.
    pub fn persist(&self, cache: &ChangeCache) -> Result<()> {
        let json = serde_json::to_string_pretty(cache)?;
        let tmp = self.tmp_path();
        self.fs.write(&tmp, json.as_bytes())?;
        self.fs.rename(&tmp, &self.path)?;
        info!(path = ?self.path, entries = cache.len(), "persisted change cache");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::RealFileSystem;
    use crate::errors::BuildError;

    #[test]
    fn missing_file_is_initialised_empty() {
        let fs = MockFileSystem::new();
        let store = CacheStore::new(Arc::new(fs.clone()), DEFAULT_CACHE_FILE);

        let cache = store.load_or_init().unwrap();
        assert!(cache.is_empty());
        assert!(fs.exists(Path::new("_build/cache")));
        assert_eq!(fs.read_to_string(Path::new(DEFAULT_CACHE_FILE)).unwrap(), "{}");
    }

    #[test]
    fn persisted_cache_reloads_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(Arc::new(RealFileSystem), dir.path().join(DEFAULT_CACHE_FILE));
        store.load_or_init().unwrap();

        let mut cache = ChangeCache::new();
        cache.record("src/main.c", 1_700_000_000_123_456_789);
        cache.record("in.txt", 5);
        store.persist(&cache).unwrap();

        assert_eq!(store.load_or_init().unwrap(), cache);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn corrupt_cache_is_reported() {
        let fs = MockFileSystem::new();
        fs.add_file(DEFAULT_CACHE_FILE, "not json");
        let store = CacheStore::new(Arc::new(fs), DEFAULT_CACHE_FILE);

        match store.load_or_init() {
            Err(BuildError::Json(_)) => {}
            other => panic!("expected Json error, got {:?}", other),
        }
    }
}
