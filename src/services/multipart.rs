//! Narrow view over a multipart request body.
//!
//! The upload pipeline only needs each part's field name, the filename the
//! client sent (if any), and a stream of its bytes.
//! [`FilePartSource`] expresses exactly that, so staging and storage never
//! touch the parsing library directly.

use crate::api::error::AppError;
use async_trait::async_trait;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// One part of a multipart body. Parts without a filename are plain form fields.
pub struct FilePart<'a> {
    pub field_name: String,
    pub file_name: Option<String>,
    pub body: BoxStream<'a, Result<Bytes, AppError>>,
}

impl FilePart<'_> {
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }
}

#[async_trait]
pub trait FilePartSource: Send {
    /// Returns the next part of the body, or `None` once it is exhausted.
    async fn next_part<'a>(&'a mut self) -> Result<Option<FilePart<'a>>, AppError>;
}

fn map_multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

#[async_trait]
impl FilePartSource for Multipart {
    async fn next_part<'a>(&'a mut self) -> Result<Option<FilePart<'a>>, AppError> {
        let Some(field) = self.next_field().await.map_err(map_multipart_error)? else {
            return Ok(None);
        };

        Ok(Some(FilePart {
            field_name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            body: field.map(|chunk| chunk.map_err(map_multipart_error)).boxed(),
        }))
    }
}

/// Upload bytes parked on local disk before they are moved to storage.
///
/// The backing file is removed when this value is dropped unless
/// [`StagedFile::keep`] is called first.
#[derive(Debug)]
pub struct StagedFile {
    pub field_name: String,
    pub file_name: String,
    pub size: u64,
    path: TempPath,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leaves the staged file on disk and returns its location.
    pub fn keep(self) -> std::io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }
}

/// Streams a part into a fresh temp file under `tmp_dir`.
///
/// Read failures from the request body surface as client errors; write
/// failures on the temp file surface as [`AppError::Storage`].
pub async fn stage_part(part: FilePart<'_>, tmp_dir: &Path) -> Result<StagedFile, AppError> {
    let FilePart {
        field_name,
        file_name,
        mut body,
    } = part;
    let file_name = file_name.unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(tmp_dir)?;
    let (std_file, path) = temp.into_parts();
    let mut file = File::from_std(std_file);

    let mut size = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;

    tracing::debug!(
        "Staged {} bytes of '{}' at {}",
        size,
        file_name,
        path.display()
    );

    Ok(StagedFile {
        field_name,
        file_name,
        size,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn part_from_chunks(chunks: Vec<Result<Bytes, AppError>>) -> FilePart<'static> {
        FilePart {
            field_name: "file".to_string(),
            file_name: Some("data.bin".to_string()),
            body: stream::iter(chunks).boxed(),
        }
    }

    #[tokio::test]
    async fn test_stage_part_writes_all_chunks_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let part = part_from_chunks(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"")),
            Ok(Bytes::from_static(b"world")),
        ]);

        let staged = stage_part(part, tmp.path()).await.unwrap();
        assert_eq!(staged.size, 11);
        assert_eq!(staged.file_name, "data.bin");
        assert!(staged.path().starts_with(tmp.path()));
        assert_eq!(tokio::fs::read(staged.path()).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_dropping_staged_file_removes_it() {
        let tmp = tempfile::tempdir().unwrap();
        let staged = stage_part(
            part_from_chunks(vec![Ok(Bytes::from_static(b"x"))]),
            tmp.path(),
        )
        .await
        .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_keep_leaves_staged_file_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let staged = stage_part(
            part_from_chunks(vec![Ok(Bytes::from_static(b"kept"))]),
            tmp.path(),
        )
        .await
        .unwrap();

        let path = staged.keep().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"kept");
    }

    #[tokio::test]
    async fn test_body_error_is_reported_as_client_error() {
        let tmp = tempfile::tempdir().unwrap();
        let part = part_from_chunks(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(AppError::BadRequest("connection reset".into())),
        ]);

        let err = stage_part(part, tmp.path()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_tmp_dir_is_storage_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let err = stage_part(part_from_chunks(vec![]), &missing).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
