//! Directory-backed [`BlobStore`].
//!
//! Objects live at `{root}/{path}`; writes go to a temp file first and are
//! renamed into place, so a reader never sees half a photo.

use super::BlobStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    /// Store under `root`; public URLs are `file://` URLs into it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let base_url = format!("file://{}", root.display());
        Self { root, base_url }
    }

    /// Serve public URLs from `base_url` instead of `file://`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing blob path '{path}'"),
            )));
        }
        Ok(self.root.join(rel))
    }
}

async fn write_then_rename(temp_path: &Path, full_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp_path, full_path).await
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let full_path = self.full_path(path)?;
        debug!(storage_path = %path, full_path = %full_path.display(), size = bytes.len(), "local_blobs: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "local_blobs: create_dir_all failed");
                e
            })?;
        }

        let temp_path = full_path.with_extension("tmp");
        if let Err(e) = write_then_rename(&temp_path, &full_path, bytes).await {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "local_blobs: write failed");
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup, "local_blobs: temp cleanup failed");
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StoreError> {
        for p in paths {
            let full_path = self.full_path(p)?;
            if fs::try_exists(&full_path).await? {
                fs::remove_file(&full_path).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_creates_nested_file_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = LocalBlobStore::new(dir.path());

        blobs.upload("abc/0.jpg", b"first", "image/jpeg").await.unwrap();
        blobs.upload("abc/0.jpg", b"second", "image/jpeg").await.unwrap();

        let stored = std::fs::read(dir.path().join("abc/0.jpg")).unwrap();
        assert_eq!(stored, b"second");
        assert!(!dir.path().join("abc/0.tmp").exists());
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = LocalBlobStore::new(dir.path());
        // A non-empty directory where the photo should land makes the rename fail.
        let blocker = dir.path().join("abc/0.jpg");
        std::fs::create_dir_all(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let err = blobs.upload("abc/0.jpg", b"photo", "image/jpeg").await;
        assert!(matches!(err, Err(StoreError::Io(_))));
        assert!(!dir.path().join("abc/0.tmp").exists());
        assert!(blocker.join("keep").exists());
    }

    #[tokio::test]
    async fn remove_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = LocalBlobStore::new(dir.path());
        blobs.upload("a/1.jpg", b"x", "image/jpeg").await.unwrap();
        blobs
            .remove(&["a/1.jpg".to_string(), "a/9.jpg".to_string()])
            .await
            .unwrap();
        assert!(!dir.path().join("a/1.jpg").exists());
    }

    #[tokio::test]
    async fn parent_traversal_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = LocalBlobStore::new(dir.path());
        assert!(blobs.upload("../x.jpg", b"x", "image/jpeg").await.is_err());
        assert!(blobs.upload("/etc/x.jpg", b"x", "image/jpeg").await.is_err());
    }

    #[test]
    fn public_url_uses_base() {
        let blobs = LocalBlobStore::new("/srv/photos").with_base_url("https://photos.test/");
        assert_eq!(blobs.public_url("c/0.jpg"), "https://photos.test/c/0.jpg");
    }
}
