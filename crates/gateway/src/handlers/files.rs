//! PDF upload and download handlers
//!
//! Uploads are raw request bodies; the stored reference is returned to the
//! client and later attached to an article version or evaluation.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::AppState;
use symposium_common::{
    auth::AuthContext,
    errors::{AppError, Result},
    storage::{extension_of, FileStore},
};

#[derive(Serialize)]
pub struct UploadResponse {
    #[serde(rename = "ref")]
    pub file_ref: String,
    pub checksum: String,
    pub size: usize,
}

/// Accept a raw body upload and persist it under a fresh reference
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthContext,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    if body.is_empty() {
        return Err(AppError::Validation {
            message: "Arquivo vazio".to_string(),
            field: None,
        });
    }
    if body.len() > state.config.storage.max_upload_bytes {
        return Err(AppError::Validation {
            message: "Arquivo excede o tamanho máximo permitido".to_string(),
            field: None,
        });
    }

    let extension = headers
        .get("x-file-name")
        .and_then(|v| v.to_str().ok())
        .map(extension_of)
        .unwrap_or("pdf");

    let stored = state.files.store(&body, extension).await?;

    tracing::info!(
        file_ref = %stored.file_ref,
        size = stored.size,
        uploaded_by = %auth.user_id,
        "File uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_ref: stored.file_ref,
            checksum: stored.checksum,
            size: stored.size,
        }),
    ))
}

/// Stream back a previously stored file
pub async fn download_file(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(file_ref): Path<String>,
) -> Result<impl IntoResponse> {
    let bytes = state.files.load(&file_ref).await?;

    let content_type = if file_ref.ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        bytes,
    ))
}
