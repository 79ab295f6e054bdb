use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("extension '{extension}' is not in the allow-list")]
    FormatNotAllowed { extension: String },

    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::FormatNotAllowed { .. } => "FORMAT_NOT_ALLOWED",
            ValidationError::TooLarge { .. } => "FILE_TOO_LARGE",
        }
    }
}

/// Reduces a client-supplied file name to its final path component.
///
/// Both `/` and `\` count as separators, whatever the host platform, so a
/// name like `..\..\boot.ini` or `../../etc/x.png` never escapes the
/// destination directory.
pub fn client_file_name(raw: &str) -> &str {
    match raw.rfind(['/', '\\']) {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    }
}

/// Substring after the final `.`, case preserved; empty when there is no `.`
pub fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => "",
    }
}

/// Checks the extension against the allow-list, case-sensitively
pub fn validate_extension(
    extension: &str,
    allowed: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    if allowed.contains(extension) {
        return Ok(());
    }

    Err(ValidationError::FormatNotAllowed {
        extension: extension.to_string(),
    })
}

/// Validates file size against maximum limit; a file of exactly `max` bytes passes
pub fn validate_file_size(size: u64, max: u64) -> Result<(), ValidationError> {
    if size > max {
        return Err(ValidationError::TooLarge { size, max });
    }
    Ok(())
}
