use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

/// Upload handling configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Accepted file extensions, compared case-sensitively (default: "jpg", "png")
    pub allowed_extensions: BTreeSet<String>,

    /// Maximum file size in bytes (default: 5,000,000)
    pub max_file_size: u64,

    /// Directory accepted images are moved into (default: "detections")
    pub destination_dir: PathBuf,

    /// Directory incoming uploads are staged in (default: OS temp dir)
    pub staging_dir: PathBuf,

    /// Map rejections to 4xx statuses instead of 200 (default: false)
    pub strict_status_codes: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: ["jpg", "png"].into_iter().map(String::from).collect(),
            max_file_size: 5_000_000, // 5 MB, decimal
            destination_dir: PathBuf::from("detections"),
            staging_dir: env::temp_dir(),
            strict_status_codes: false,
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            allowed_extensions: lookup("ALLOWED_EXTENSIONS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().trim_start_matches('.').to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<BTreeSet<_>>()
                })
                .filter(|set| !set.is_empty())
                .unwrap_or(default.allowed_extensions),

            max_file_size: lookup("MAX_FILE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            destination_dir: lookup("DETECTIONS_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.destination_dir),

            staging_dir: lookup("STAGING_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            strict_status_codes: lookup("STRICT_STATUS_CODES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.strict_status_codes),
        }
    }

    /// Config rooted at the given directories, used by tests and tooling
    pub fn with_dirs(destination_dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            staging_dir: staging_dir.into(),
            ..Self::default()
        }
    }

    /// Request body cap: the file limit plus room for multipart framing and other fields
    pub fn body_limit(&self) -> usize {
        const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024;
        usize::try_from(self.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD)
    }
}
