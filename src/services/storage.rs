use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{PathPersistError, TempPath};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

const STAGING_PREFIX: &str = ".upload-";
const COPY_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read upload body: {0}")]
    Body(#[source] io::Error),

    #[error("failed to stage upload in {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move upload to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to store file under name {0:?}")]
    InvalidName(String),
}

/// An upload written to a temporary file. Dropping it removes the file.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written while staging, capped at the staging limit plus one
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Streams `reader` into a temporary file, stopping after `limit + 1` bytes.
    async fn stage<'a>(
        &self,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        limit: u64,
    ) -> Result<StagedFile, StorageError>;

    /// Moves a staged file into the destination directory under `file_name`,
    /// replacing any existing file of that name.
    async fn persist(&self, staged: StagedFile, file_name: &str) -> Result<PathBuf, StorageError>;

    /// Whether the destination directory exists and is a directory
    async fn is_available(&self) -> bool;

    fn destination_dir(&self) -> &Path;
}

pub struct LocalStorageService {
    destination_dir: PathBuf,
    staging_dir: PathBuf,
}

impl LocalStorageService {
    pub fn new(destination_dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            staging_dir: staging_dir.into(),
        }
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn stage<'a>(
        &self,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        limit: u64,
    ) -> Result<StagedFile, StorageError> {
        let staging_error = |source: io::Error| StorageError::Staging {
            path: self.staging_dir.clone(),
            source,
        };

        let (file, path) = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.staging_dir)
            .map_err(staging_error)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut reader = reader.take(limit.saturating_add(1));
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut size = 0u64;

        loop {
            let n = reader.read(&mut buffer).await.map_err(StorageError::Body)?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n]).await.map_err(staging_error)?;
            size += n as u64;
        }
        file.flush().await.map_err(staging_error)?;

        debug!(staged = %path.display(), size, "upload staged");
        Ok(StagedFile { path, size })
    }

    async fn persist(&self, staged: StagedFile, file_name: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_file_name(file_name) {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }

        let target = self.destination_dir.join(file_name);
        let destination_dir = self.destination_dir.clone();
        let moved_target = target.clone();

        tokio::task::spawn_blocking(move || {
            move_into_place(staged.path, &destination_dir, &moved_target)
        })
        .await
        .map_err(|e| StorageError::Persist {
            path: target.clone(),
            source: io::Error::other(e),
        })?
        .map_err(|source| StorageError::Persist {
            path: target.clone(),
            source,
        })?;

        Ok(target)
    }

    async fn is_available(&self) -> bool {
        tokio::fs::metadata(&self.destination_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Renames the staged file over `target`, falling back to
/// [`copy_into_place`] when staging lives on another filesystem.
fn move_into_place(staged: TempPath, destination_dir: &Path, target: &Path) -> io::Result<()> {
    match staged.persist(target) {
        Ok(()) => set_published_permissions(target),
        Err(PathPersistError { error, path }) => {
            debug!(error = %error, "rename from staging failed, copying instead");
            copy_into_place(&path, destination_dir, target)
        }
    }
}

/// Copies `staged` into a temporary file next to `target`, then renames it
/// over `target`. Readers never see a partially written file.
fn copy_into_place(staged: &Path, destination_dir: &Path, target: &Path) -> io::Result<()> {
    let (mut file, sibling) = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(destination_dir)?
        .into_parts();
    let mut source = std::fs::File::open(staged)?;
    io::copy(&mut source, &mut file)?;
    file.sync_all()?;
    drop(file);

    sibling.persist(target).map_err(|e| {
        warn!(target = %target.display(), error = %e.error, "rename into destination failed");
        e.error
    })?;
    set_published_permissions(target)
}

// Staging files are created 0600; detections are served to anyone.
#[cfg(unix)]
fn set_published_permissions(target: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(target, std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_published_permissions(_target: &Path) -> io::Result<()> {
    Ok(())
}
