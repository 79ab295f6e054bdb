use crate::AppState;
use crate::api::error::AppError;
use crate::models::UploadOutcome;
use axum::{
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
    },
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::debug;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "captured_image";

#[utoipa::path(
    post,
    path = "/",
    request_body(content = crate::models::CapturedImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Empty when no image was sent, otherwise one of: `FILE => File Format Not Allowed!`, `FILE => File size cannot exceed 5MB!`, `FILE => Saved Successfully!`", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed multipart body", body = String, content_type = "text/plain"),
        (status = 413, description = "Too large (only with STRICT_STATUS_CODES)", body = String, content_type = "text/plain"),
        (status = 415, description = "Format not allowed (only with STRICT_STATUS_CODES)", body = String, content_type = "text/plain"),
        (status = 500, description = "The image could not be written to the detections directory", body = String, content_type = "text/plain")
    ),
    tag = "detections"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let strict = state.config.strict_status_codes;

    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("No multipart body ({}), nothing to do", rejection);
            return Ok(reply(UploadOutcome::Idle, strict));
        }
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // A plain form value under the same name is not a file upload.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let reader = StreamReader::new(field.map_err(std::io::Error::other));
        let outcome = state
            .upload_service
            .handle_upload(&file_name, Box::new(reader))
            .await?;

        // Only the first file under the field name counts.
        return Ok(reply(outcome, strict));
    }

    Ok(reply(UploadOutcome::Idle, strict))
}

fn reply(outcome: UploadOutcome, strict: bool) -> Response {
    (outcome.status_code(strict), outcome.message()).into_response()
}
