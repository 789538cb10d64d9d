//! Authentication middleware
//!
//! Verifies HS256 bearer tokens and pins the request to the tenant named in
//! the token.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::AppState;

/// Header a client may send to assert its tenant; it must agree with the token
pub const TENANT_HEADER: &str = "x-tenant";

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub tenant: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub admin: bool,
}

impl AuthUser {
    /// Callers without the admin flag get a 403
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.admin {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Only administrators can generate uploads".to_string(),
                message_pt: "Apenas administradores podem gerar upload.".to_string(),
            })
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, rename = "tenantSlug", skip_serializing_if = "Option::is_none")]
    pub tenant_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Tenant slug from `tenant`, falling back to `tenantSlug`
    pub fn tenant(&self) -> Option<&str> {
        [self.tenant.as_deref(), self.tenant_slug.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(msg) => return unauthorized_response(&msg),
    };

    let auth_user = match authorize(&claims, request.headers()) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    tracing::debug!(user = %auth_user.user_id, tenant = %auth_user.tenant, "Authenticated request");
    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller from verified claims; the token is the tenant's source of truth
pub fn authorize(claims: &Claims, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let tenant = claims.tenant().ok_or(AppError::MissingTenant)?;

    let header_tenant = headers
        .get(TENANT_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(header_tenant) = header_tenant {
        if !header_tenant.eq_ignore_ascii_case(tenant) {
            return Err(AppError::Forbidden {
                message: "Tenant header does not match token".to_string(),
                message_pt: "Tenant do header nao corresponde ao token.".to_string(),
            });
        }
    }

    Ok(AuthUser {
        user_id: claims.sub.clone(),
        tenant: tenant.to_string(),
        email: claims.email.clone(),
        name: claims.name.clone(),
        admin: claims.admin.unwrap_or(false),
    })
}

/// Decode and validate JWT token
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    // `exp` is checked when present but not required
    let mut validation = Validation::default();
    validation.set_required_spec_claims::<&str>(&[]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.trim().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail::new("UNAUTHORIZED", message, "Nao autorizado"),
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail::new(
                        "UNAUTHORIZED",
                        "Authentication required",
                        "Autenticacao obrigatoria",
                    ),
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
