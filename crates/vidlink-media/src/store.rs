//! Directory-backed blob store the media operations read and write.

use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{MediaError, Result};

/// File-backed blob store.
///
/// Every operation addresses a file as `(store, name)`: the store handle
/// names a subdirectory of the root and the name a file inside it,
/// mirroring the database/filename pair the wire operations carry. Both
/// must be plain path components; anything that could escape the root is
/// rejected before the filesystem is touched.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| MediaError::StoreUnavailable {
                path: root.clone(),
                source,
            })?;
        debug!(root = %root.display(), "opened media store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a whole file.
    pub async fn load(&self, store: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(store, name)?;
        trace!(path = %path.display(), "loading blob");
        tokio::fs::read(&path).await.map_err(MediaError::Load)
    }

    /// Write a whole file, creating the store directory on first use.
    pub async fn save(&self, store: &str, name: &str, bytes: &[u8]) -> Result<()> {
        let dir = self.store_dir(store)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(MediaError::Write)?;
        let path = dir.join(validate_component(name)?);
        trace!(path = %path.display(), len = bytes.len(), "saving blob");
        tokio::fs::write(&path, bytes).await.map_err(MediaError::Write)
    }

    pub async fn remove(&self, store: &str, name: &str) -> Result<()> {
        let path = self.file_path(store, name)?;
        tokio::fs::remove_file(&path).await.map_err(MediaError::Write)
    }

    pub async fn contains(&self, store: &str, name: &str) -> Result<bool> {
        let path = self.file_path(store, name)?;
        tokio::fs::try_exists(&path).await.map_err(MediaError::Load)
    }

    /// File names in a store, sorted. A store that was never written to is
    /// just empty.
    pub async fn list(&self, store: &str) -> Result<Vec<String>> {
        let dir = self.store_dir(store)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(MediaError::Load(err)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(MediaError::Load)? {
            let file_type = entry.file_type().await.map_err(MediaError::Load)?;
            if !file_type.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    fn store_dir(&self, store: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_component(store)?))
    }

    fn file_path(&self, store: &str, name: &str) -> Result<PathBuf> {
        Ok(self.store_dir(store)?.join(validate_component(name)?))
    }
}

/// A store handle or file name must be exactly one normal path component.
fn validate_component(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == OsStr::new(name) => Ok(name),
        _ => Err(MediaError::InvalidName(name.to_string())),
    }
}
