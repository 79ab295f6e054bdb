use crate::config::UploadConfig;
use crate::models::{UploadOutcome, UploadedFile};
use crate::services::storage::{StorageError, StorageService};
use crate::utils::validation::{
    client_file_name, file_extension, validate_extension, validate_file_size,
};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{debug, info};

/// Runs the validate-then-store sequence for one uploaded image.
pub struct UploadService {
    config: UploadConfig,
    storage: Arc<dyn StorageService>,
}

impl UploadService {
    pub fn new(config: UploadConfig, storage: Arc<dyn StorageService>) -> Self {
        Self { config, storage }
    }

    /// Checks are strictly ordered and short-circuit: extension, then size,
    /// then the move into the destination directory. The body is only read
    /// once the extension has been accepted.
    pub async fn handle_upload<'a>(
        &self,
        client_name: &str,
        body: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadOutcome, StorageError> {
        let name = client_file_name(client_name);
        if name.is_empty() {
            debug!("captured_image present without a file name, nothing to do");
            return Ok(UploadOutcome::Idle);
        }

        if let Err(e) = validate_extension(file_extension(name), &self.config.allowed_extensions)
        {
            info!(file = %name, code = e.code(), "🚫 Rejected upload: {}", e);
            return Ok(UploadOutcome::FormatNotAllowed);
        }

        let staged = self.storage.stage(body, self.config.max_file_size).await?;
        let file = UploadedFile::new(name, staged);

        if let Err(e) = validate_file_size(file.size, self.config.max_file_size) {
            info!(file = %file.name, code = e.code(), "🚫 Rejected upload: {}", e);
            return Ok(UploadOutcome::TooLarge);
        }

        let stored = self
            .storage
            .persist(file.temporary_location, &file.name)
            .await?;
        info!(
            "💾 Saved {} ({} bytes, .{}) to {}",
            file.name,
            file.size,
            file.extension,
            stored.display()
        );

        Ok(UploadOutcome::Saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::{LocalStorageService, StagedFile};
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn body(data: Vec<u8>) -> Box<dyn AsyncRead + Unpin + Send + 'static> {
        Box::new(Cursor::new(data))
    }

    fn local_service(max_file_size: u64) -> (UploadService, TempDir, TempDir) {
        let dest = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let config = UploadConfig {
            max_file_size,
            ..UploadConfig::with_dirs(dest.path(), staging.path())
        };
        let storage = Arc::new(LocalStorageService::new(dest.path(), staging.path()));
        (UploadService::new(config, storage), dest, staging)
    }

    /// Counts staging calls; persisting always fails.
    struct CountingStorage {
        stage_calls: AtomicUsize,
        inner: LocalStorageService,
    }

    #[async_trait]
    impl StorageService for CountingStorage {
        async fn stage<'a>(
            &self,
            reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
            limit: u64,
        ) -> Result<StagedFile, StorageError> {
            self.stage_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.stage(reader, limit).await
        }

        async fn persist(&self, _staged: StagedFile, file_name: &str) -> Result<PathBuf, StorageError> {
            Err(StorageError::Persist {
                path: PathBuf::from(file_name),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        async fn is_available(&self) -> bool {
            false
        }

        fn destination_dir(&self) -> &Path {
            self.inner.destination_dir()
        }
    }

    #[tokio::test]
    async fn test_saves_allowed_file() {
        let (service, dest, _staging) = local_service(5_000_000);

        let outcome = service
            .handle_upload("leaf.jpg", body(b"jpeg bytes".to_vec()))
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::Saved);
        assert_eq!(std::fs::read(dest.path().join("leaf.jpg")).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_empty_name_is_idle() {
        let (service, dest, _staging) = local_service(5_000_000);

        let outcome = service.handle_upload("", body(b"data".to_vec())).await.unwrap();

        assert_eq!(outcome, UploadOutcome::Idle);
        assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_size_rejection_stores_nothing() {
        let (service, dest, staging) = local_service(10);

        let outcome = service
            .handle_upload("big.png", body(vec![0u8; 11]))
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::TooLarge);
        assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_format_rejection_never_reads_body() {
        let dest = tempfile::tempdir().unwrap();
        let storage = Arc::new(CountingStorage {
            stage_calls: AtomicUsize::new(0),
            inner: LocalStorageService::new(dest.path(), dest.path()),
        });
        let service = UploadService::new(
            UploadConfig::with_dirs(dest.path(), dest.path()),
            storage.clone(),
        );

        let outcome = service
            .handle_upload("photo.exe", body(vec![0u8; 10_000_000]))
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::FormatNotAllowed);
        assert_eq!(storage.stage_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_an_error() {
        let dest = tempfile::tempdir().unwrap();
        let storage = Arc::new(CountingStorage {
            stage_calls: AtomicUsize::new(0),
            inner: LocalStorageService::new(dest.path(), dest.path()),
        });
        let service = UploadService::new(
            UploadConfig::with_dirs(dest.path(), dest.path()),
            storage.clone(),
        );

        let err = service
            .handle_upload("leaf.png", body(b"png".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Persist { .. }));
        assert_eq!(storage.stage_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_directory_components_are_dropped() {
        let (service, dest, _staging) = local_service(5_000_000);

        let outcome = service
            .handle_upload("../../escape.png", body(b"png".to_vec()))
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::Saved);
        assert!(dest.path().join("escape.png").exists());
    }
}
