use crate::config::UploadConfig;
use crate::services::storage::LocalStorageService;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// Creates the staging and storage directories and returns the storage backend.
pub async fn setup_storage(config: &UploadConfig) -> anyhow::Result<Arc<LocalStorageService>> {
    for dir in [&config.tmp_dir, &config.uploads_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    info!(
        "📁 Local Storage: {} (staging in {})",
        config.uploads_dir.display(),
        config.tmp_dir.display()
    );

    Ok(Arc::new(LocalStorageService::new(&config.uploads_dir)))
}
