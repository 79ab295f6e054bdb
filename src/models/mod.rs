use crate::services::storage::StagedFile;
use crate::utils::validation::file_extension;
use axum::http::StatusCode;
use utoipa::ToSchema;

/// An incoming image, alive for the duration of one request.
#[derive(Debug)]
pub struct UploadedFile {
    pub name: String,
    pub temporary_location: StagedFile,
    pub size: u64,
    pub extension: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, staged: StagedFile) -> Self {
        let name = name.into();
        let extension = file_extension(&name).to_string();
        Self {
            size: staged.size(),
            temporary_location: staged,
            name,
            extension,
        }
    }
}

/// Result of one pass through the upload handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No `captured_image` file in the request
    Idle,
    FormatNotAllowed,
    TooLarge,
    Saved,
}

impl UploadOutcome {
    pub fn message(self) -> &'static str {
        match self {
            UploadOutcome::Idle => "",
            UploadOutcome::FormatNotAllowed => "FILE => File Format Not Allowed!",
            UploadOutcome::TooLarge => "FILE => File size cannot exceed 5MB!",
            UploadOutcome::Saved => "FILE => Saved Successfully!",
        }
    }

    /// Rejections answer 200 like everything else unless `strict` is set.
    pub fn status_code(self, strict: bool) -> StatusCode {
        match (self, strict) {
            (UploadOutcome::FormatNotAllowed, true) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            (UploadOutcome::TooLarge, true) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::OK,
        }
    }
}

/// Multipart form accepted by the upload endpoint
#[derive(ToSchema)]
pub struct CapturedImageForm {
    /// The image; only `.jpg` and `.png` names are accepted by default
    #[schema(value_type = String, format = Binary)]
    pub captured_image: Vec<u8>,
}
