use std::env;
use std::path::PathBuf;

/// Slack added on top of `max_file_size` for multipart boundaries and part headers.
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Runtime configuration for the upload server
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Address the HTTP listener binds to (default: "0.0.0.0")
    pub bind_addr: String,

    /// Port for the HTTP listener (default: 5000)
    pub port: u16,

    /// Directory holding staged uploads while they are copied (default: "./tmp")
    pub tmp_dir: PathBuf,

    /// Permanent storage directory (default: "./uploads")
    pub uploads_dir: PathBuf,

    /// Maximum file size in bytes (default: 1 GB)
    pub max_file_size: usize,

    /// Leave staged temp files on disk after the copy (default: false)
    pub keep_staged_files: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            tmp_dir: PathBuf::from("./tmp"),
            uploads_dir: PathBuf::from("./uploads"),
            max_file_size: 1024 * 1024 * 1024, // 1 GB
            keep_staged_files: false,
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(default.bind_addr),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            tmp_dir: env::var("TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.tmp_dir),

            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.uploads_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            keep_staged_files: env::var("KEEP_STAGED_FILES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.keep_staged_files),
        }
    }

    /// Defaults with explicit staging and storage directories
    pub fn for_dirs(tmp_dir: impl Into<PathBuf>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
            uploads_dir: uploads_dir.into(),
            ..Self::default()
        }
    }

    /// Request body limit applied to `POST /upload`
    pub fn body_limit(&self) -> usize {
        self.max_file_size.saturating_add(MULTIPART_OVERHEAD)
    }
}
