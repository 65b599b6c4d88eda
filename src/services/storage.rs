use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Streams the file at `source` into storage under `name`, replacing any
    /// existing object of that name. Returns the number of bytes written.
    async fn store_from_path(&self, source: &Path, name: &str) -> io::Result<u64>;
    async fn read(&self, name: &str) -> io::Result<Vec<u8>>;
    async fn exists(&self, name: &str) -> io::Result<bool>;
    async fn is_ready(&self) -> bool;
}

/// Stores uploads as plain files under a single directory.
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn store_from_path(&self, source: &Path, name: &str) -> io::Result<u64> {
        let dest = self.path_for(name);

        // Both handles close when they go out of scope, on success or on `?`.
        let mut reader = File::open(source).await?;
        let mut writer = File::create(&dest).await?;

        let copied = tokio::io::copy(&mut reader, &mut writer).await?;
        writer.flush().await?;

        tracing::debug!("Copied {} bytes to {}", copied, dest.display());
        Ok(copied)
    }

    async fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path_for(name)).await
    }

    async fn exists(&self, name: &str) -> io::Result<bool> {
        tokio::fs::try_exists(self.path_for(name)).await
    }

    async fn is_ready(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
