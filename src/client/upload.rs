use crate::client::ClientError;
use crate::client::progress::ProgressTracker;
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

/// Default endpoint of a locally running server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/upload";

/// The file a user picked, as it will be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub len: u64,
}

/// Turns a picker result into an upload candidate. `None` (picker cancelled)
/// yields `Ok(None)` and touches nothing.
pub async fn select_file(path: Option<PathBuf>) -> Result<Option<SelectedFile>, ClientError> {
    let Some(path) = path else {
        return Ok(None);
    };

    let metadata = tokio::fs::metadata(&path).await?;
    if !metadata.is_file() {
        return Err(ClientError::NotAFile(path));
    }

    let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
        return Err(ClientError::NotAFile(path));
    };

    Ok(Some(SelectedFile {
        path,
        file_name,
        len: metadata.len(),
    }))
}

pub struct UploadClient {
    http: Client,
    endpoint: String,
}

impl UploadClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `file` as the `file` part of a multipart POST.
    ///
    /// The body is streamed from disk. Each chunk handed to the transport
    /// advances `tracker`; on a 2xx response the tracker ends in `Done` and
    /// the response text is returned. Transport failures and non-2xx
    /// responses leave it in `Failed` and are returned as errors.
    pub async fn upload(
        &self,
        file: &SelectedFile,
        tracker: &mut ProgressTracker,
    ) -> Result<String, ClientError> {
        tracker.start(file.len);

        let source = match tokio::fs::File::open(&file.path).await {
            Ok(source) => source,
            Err(e) => {
                tracker.fail(e.to_string());
                return Err(e.into());
            }
        };

        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel::<u64>();
        let stream = ReaderStream::new(source).inspect_ok(move |chunk| {
            let _ = sent_tx.send(chunk.len() as u64);
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), file.len)
            .file_name(file.file_name.clone());
        let form = Form::new().part("file", part);

        tracing::info!(
            "⬆️  Uploading {} ({} bytes) to {}",
            file.file_name,
            file.len,
            self.endpoint
        );

        let request = self.http.post(&self.endpoint).multipart(form).send();
        tokio::pin!(request);

        let response = loop {
            tokio::select! {
                biased;
                Some(bytes) = sent_rx.recv() => tracker.advance(bytes),
                response = &mut request => break response,
            }
        };
        while let Ok(bytes) = sent_rx.try_recv() {
            tracker.advance(bytes);
        }

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracker.fail(e.to_string());
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracker.fail(e.to_string());
                return Err(e.into());
            }
        };

        if !status.is_success() {
            tracker.fail(format!("{}: {}", status, body));
            return Err(ClientError::Rejected { status, body });
        }

        tracker.finish();
        Ok(body)
    }
}
