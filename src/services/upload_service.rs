use crate::api::error::AppError;
use crate::config::UploadConfig;
use crate::services::multipart::{FilePartSource, StagedFile, stage_part};
use crate::services::storage::StorageService;
use crate::utils::validation::sanitize_filename;
use std::sync::Arc;
use tracing::{info, warn};

/// Multipart field the upload must arrive under.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub filename: String,
    pub size: u64,
}

pub struct UploadService {
    storage: Arc<dyn StorageService>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageService>, config: UploadConfig) -> Self {
        Self { storage, config }
    }

    /// Stages the `file` part of a multipart body and streams it into storage.
    ///
    /// Nothing is written to the uploads directory unless a `file` part with
    /// an acceptable filename is present. The first such part wins; any parts
    /// after it are left unread.
    pub async fn handle_upload<S>(&self, source: &mut S) -> Result<StoredUpload, AppError>
    where
        S: FilePartSource + ?Sized,
    {
        let mut staged = None;

        while let Some(part) = source.next_part().await? {
            if part.field_name != FILE_FIELD || !part.is_file() {
                continue;
            }

            let raw_name = part.file_name.as_deref().unwrap_or_default();
            let filename = sanitize_filename(raw_name)?;
            let file = stage_part(part, &self.config.tmp_dir).await?;
            staged = Some((filename, file));
            break;
        }

        let (filename, file) = staged.ok_or(AppError::MissingFile)?;
        let size = self.persist(&filename, file).await?;

        info!("💾 Stored '{}' ({} bytes)", filename, size);
        Ok(StoredUpload { filename, size })
    }

    async fn persist(&self, filename: &str, file: StagedFile) -> Result<u64, AppError> {
        let expected = file.size;
        let result = self.storage.store_from_path(file.path(), filename).await;

        if self.config.keep_staged_files {
            match file.keep() {
                Ok(path) => info!("Keeping staged file at {}", path.display()),
                Err(e) => warn!("Failed to keep staged file: {}", e),
            }
        }

        let copied = result?;
        if copied != expected {
            return Err(AppError::Storage(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("copied {} of {} staged bytes", copied, expected),
            )));
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::multipart::FilePart;
    use crate::services::storage::LocalStorageService;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream::{self, StreamExt};
    use std::collections::VecDeque;
    use std::io;
    use std::path::Path;

    struct MemoryParts(VecDeque<(String, Option<String>, Vec<u8>)>);

    impl MemoryParts {
        fn new(parts: &[(&str, Option<&str>, &str)]) -> Self {
            Self(
                parts
                    .iter()
                    .map(|(field, name, body)| {
                        (field.to_string(), name.map(str::to_string), body.as_bytes().to_vec())
                    })
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl FilePartSource for MemoryParts {
        async fn next_part<'a>(&'a mut self) -> Result<Option<FilePart<'a>>, AppError> {
            Ok(self.0.pop_front().map(|(field_name, file_name, body)| FilePart {
                field_name,
                file_name,
                body: stream::iter(vec![Ok(Bytes::from(body))]).boxed(),
            }))
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl StorageService for BrokenStorage {
        async fn store_from_path(&self, _source: &Path, _name: &str) -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
        }
        async fn read(&self, _name: &str) -> io::Result<Vec<u8>> {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
        async fn exists(&self, _name: &str) -> io::Result<bool> {
            Ok(false)
        }
        async fn is_ready(&self) -> bool {
            false
        }
    }

    fn service_in(dir: &Path) -> (UploadService, Arc<LocalStorageService>, UploadConfig) {
        let config = UploadConfig::for_dirs(dir.join("tmp"), dir.join("uploads"));
        std::fs::create_dir_all(&config.tmp_dir).unwrap();
        std::fs::create_dir_all(&config.uploads_dir).unwrap();
        let storage = Arc::new(LocalStorageService::new(&config.uploads_dir));
        (
            UploadService::new(storage.clone(), config.clone()),
            storage,
            config,
        )
    }

    fn dir_is_empty(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_skips_fields_until_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let (service, storage, config) = service_in(dir.path());
        let mut parts = MemoryParts::new(&[
            ("description", None, "quarterly numbers"),
            ("avatar", Some("me.png"), "not this one"),
            ("file", Some("report.pdf"), "%PDF-1.7 body"),
            ("file", Some("second.pdf"), "ignored"),
        ]);

        let stored = service.handle_upload(&mut parts).await.unwrap();
        assert_eq!(
            stored,
            StoredUpload {
                filename: "report.pdf".to_string(),
                size: 13
            }
        );
        assert_eq!(storage.read("report.pdf").await.unwrap(), b"%PDF-1.7 body");
        assert!(!storage.exists("second.pdf").await.unwrap());
        assert!(!storage.exists("me.png").await.unwrap());
        assert!(dir_is_empty(&config.tmp_dir));
    }

    #[tokio::test]
    async fn test_missing_file_part_has_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _storage, config) = service_in(dir.path());
        let mut parts = MemoryParts::new(&[("file", None, "plain text field")]);

        let err = service.handle_upload(&mut parts).await.unwrap_err();
        assert!(matches!(err, AppError::MissingFile));
        assert!(dir_is_empty(&config.uploads_dir));
        assert!(dir_is_empty(&config.tmp_dir));
    }

    #[tokio::test]
    async fn test_invalid_filename_is_rejected_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _storage, config) = service_in(dir.path());
        let mut parts = MemoryParts::new(&[("file", Some(".."), "escape")]);

        let err = service.handle_upload(&mut parts).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFilename(_)));
        assert!(dir_is_empty(&config.tmp_dir));
        assert!(dir_is_empty(&config.uploads_dir));
    }

    #[tokio::test]
    async fn test_storage_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig::for_dirs(dir.path(), dir.path().join("unused"));
        let service = UploadService::new(Arc::new(BrokenStorage), config);
        let mut parts = MemoryParts::new(&[("file", Some("a.txt"), "data")]);

        let err = service.handle_upload(&mut parts).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        // The staged file is still cleaned up on the error path.
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_keep_staged_files_leaves_copy_in_tmp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (_, storage, mut config) = service_in(dir.path());
        config.keep_staged_files = true;
        let service = UploadService::new(storage.clone(), config.clone());
        let mut parts = MemoryParts::new(&[("file", Some("notes.txt"), "keep me")]);

        service.handle_upload(&mut parts).await.unwrap();

        let staged: Vec<_> = std::fs::read_dir(&config.tmp_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(staged.len(), 1);
        assert_eq!(std::fs::read(&staged[0]).unwrap(), b"keep me");
        assert_eq!(storage.read("notes.txt").await.unwrap(), b"keep me");
    }
}
