use crate::AppState;
use crate::api::error::AppError;
use axum::extract::{Multipart, State, multipart::MultipartRejection};
use utoipa::ToSchema;

/// Body returned once the upload has been copied into storage.
pub const UPLOAD_CONFIRMATION: &str = "file uploaded and saved";

/// Shape of the multipart body accepted by `POST /upload`.
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = String, content_type = "text/plain"),
        (status = 400, description = "No file part, malformed multipart body, or unusable filename"),
        (status = 413, description = "Body exceeds the configured size limit"),
        (status = 500, description = "Writing to storage failed")
    ),
    tag = "upload"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    state.upload_service.handle_upload(&mut multipart).await?;
    Ok(UPLOAD_CONFIRMATION)
}
