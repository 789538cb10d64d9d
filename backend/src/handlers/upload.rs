//! HTTP handlers for presigned uploads

use axum::{
    extract::State,
    http::{
        header::{HOST, ORIGIN, REFERER},
        HeaderMap, StatusCode,
    },
    Json,
};
use shared::{validate_upload_file, PresignedUpload, PresignedUrlRequest};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::RequestOrigin;
use crate::AppState;

const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Issue a presigned PUT URL for an admin upload
pub async fn create_presigned_url(
    State(state): State<AppState>,
    current_user: CurrentUser,
    headers: HeaderMap,
    Json(input): Json<PresignedUrlRequest>,
) -> AppResult<(StatusCode, Json<PresignedUpload>)> {
    current_user.0.require_admin()?;
    input.validate()?;

    let file_type = validate_upload_file(&input.file_type, input.file_size).map_err(|msg| {
        let message_pt = match msg {
            "File type not allowed" => "Tipo de arquivo nao permitido.",
            "File exceeds the maximum allowed size" => "Arquivo excede o tamanho maximo permitido.",
            _ => "Tamanho do arquivo invalido.",
        };
        AppError::validation(msg, message_pt)
    })?;

    let origin = RequestOrigin {
        origin: first_header(&headers, &[ORIGIN.as_str(), REFERER.as_str()]),
        host: first_header(&headers, &[X_FORWARDED_HOST, HOST.as_str()]),
    };

    let upload = state
        .uploads
        .presign_upload(&current_user.0.tenant, &file_type, &origin)?;
    Ok((StatusCode::CREATED, Json(upload)))
}

/// First non-empty header among `names`
fn first_header(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    })
}
