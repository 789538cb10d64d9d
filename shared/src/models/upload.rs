//! Presigned upload models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /upload/presigned`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlRequest {
    #[validate(length(max = 255))]
    pub file_name: String,
    #[validate(length(max = 100))]
    pub file_type: String,
    #[validate(range(min = 1))]
    pub file_size: i64,
}

/// A time-limited upload slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub file_url: String,
    pub file_key: String,
}
