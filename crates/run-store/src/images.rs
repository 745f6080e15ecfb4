//! PNG image storage keyed by artifact name
//!
//! Names may contain `/` to group artifacts (e.g. `baselines/login-page`);
//! everything else outside `[A-Za-z0-9._-]` is rejected rather than
//! silently rewritten, so a name always maps to exactly one path.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::errors::StoreError;

/// PNG blob storage. Writes to the same name are last-writer-wins.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn exists(&self, name: &str) -> Result<bool, StoreError>;
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.starts_with('/') || name.contains("..") {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    let ok = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | ' '));
    if !ok {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Filesystem store rooted at a directory; `name` maps to `<root>/<name>.png`.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(format!("{}.png", name)))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!(name, path = %path.display(), size = bytes.len(), "image stored");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(name)?.exists())
    }
}

/// In-memory store for tests and ephemeral workers.
#[derive(Default)]
pub struct MemoryImageStore {
    images: DashMap<String, Vec<u8>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        self.images.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_name(name)?;
        Ok(self.images.get(name).map(|entry| entry.clone()))
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        validate_name(name)?;
        Ok(self.images.contains_key(name))
    }
}
