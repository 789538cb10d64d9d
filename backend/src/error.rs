//! Error handling for the Stock Movement API
//!
//! Provides consistent error responses in English and Portuguese

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{AmountOverflow, DateRangeError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {message}")]
    Forbidden { message: String, message_pt: String },

    #[error("Tenant not found in JWT token")]
    MissingTenant,

    #[error("Tenant '{0}' not found or inactive")]
    TenantNotFound(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: Option<String>,
        message: String,
        message_pt: String,
    },

    #[error("Missing required fields in payload: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] validator::ValidationErrors),

    #[error("Not found: {message}")]
    NotFound { message: String, message_pt: String },

    // External service errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>, message_pt: impl Into<String>) -> Self {
        AppError::Validation {
            field: None,
            message: message.into(),
            message_pt: message_pt.into(),
        }
    }

    pub fn field(field: &str, message: impl Into<String>, message_pt: impl Into<String>) -> Self {
        AppError::Validation {
            field: Some(field.to_string()),
            message: message.into(),
            message_pt: message_pt.into(),
        }
    }

    pub fn not_found(message: impl Into<String>, message_pt: impl Into<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
            message_pt: message_pt.into(),
        }
    }
}

impl From<DateRangeError> for AppError {
    fn from(err: DateRangeError) -> Self {
        let (field, message_pt) = match err {
            DateRangeError::InvalidFrom => ("from", "Parametro \"from\" invalido."),
            DateRangeError::InvalidTo => ("to", "Parametro \"to\" invalido."),
            DateRangeError::Inverted => ("from", "O intervalo de datas esta invalido (from apos to)."),
        };
        AppError::field(field, err.to_string(), message_pt)
    }
}

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::validation(err.to_string(), "Valor fora do intervalo permitido.")
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_pt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message_en: impl Into<String>, message_pt: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: message_en.into(),
            message_pt: message_pt.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Not-found and bad-request share one client error kind; only the code differs.
        let (status, error_detail) = match &self {
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", msg.clone(), "Nao autorizado"),
            ),
            AppError::Forbidden { message, message_pt } => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("FORBIDDEN", message.clone(), message_pt.clone()),
            ),
            AppError::MissingTenant => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "TENANT_MISSING",
                    "Tenant not found in JWT token",
                    "Tenant nao encontrado no token JWT.",
                ),
            ),
            AppError::TenantNotFound(slug) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "TENANT_NOT_FOUND",
                    format!("Tenant '{}' not found or inactive", slug),
                    format!("Tenant '{}' nao encontrado ou inativo em t_acessos.", slug),
                ),
            ),
            AppError::Validation { field, message, message_pt } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: field.clone(),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_pt.clone())
                },
            ),
            AppError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "MISSING_FIELDS",
                    format!("Missing required fields in payload: {}.", fields.join(", ")),
                    format!("Campos obrigatorios ausentes no payload: {}.", fields.join(", ")),
                ),
            ),
            AppError::InvalidPayload(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "VALIDATION_ERROR",
                    errors.to_string(),
                    format!("Dados invalidos: {}", errors),
                ),
            ),
            AppError::NotFound { message, message_pt } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("NOT_FOUND", message.clone(), message_pt.clone()),
            ),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "STORAGE_ERROR",
                    "Failed to prepare upload",
                    "Erro ao preparar upload de imagem",
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "CONFIGURATION_ERROR",
                    format!("Configuration error: {}", msg),
                    format!("Erro de configuracao: {}", msg),
                ),
            ),
            AppError::DatabaseError(_) | AppError::MigrationError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred",
                    "Ocorreu um erro no banco de dados",
                ),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                    "Ocorreu um erro interno no servidor",
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
