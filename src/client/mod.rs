//! Client side of the upload: pick one file, POST it as multipart, and track
//! progress as a 0-100 percentage.

pub mod progress;
pub mod upload;

pub use progress::{ProgressTracker, UploadProgress};
pub use upload::{SelectedFile, UploadClient, select_file};

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server rejected upload with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}
