use crate::config::UploadConfig;
use crate::services::storage::{LocalStorageService, StorageService};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_storage(config: &UploadConfig) -> Arc<dyn StorageService> {
    info!(
        "📁 Detections directory: {} (staging in {})",
        config.destination_dir.display(),
        config.staging_dir.display()
    );

    let storage = LocalStorageService::new(&config.destination_dir, &config.staging_dir);

    // Never created here: uploads fail with a storage error until it exists.
    if !storage.is_available().await {
        warn!(
            "⚠️  Detections directory {} does not exist; uploads will fail until it is created",
            config.destination_dir.display()
        );
    }

    Arc::new(storage)
}
