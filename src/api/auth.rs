use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::types::{LoginRequest, TokenDto};
use super::{ApiError, AppState};
use crate::domain::{UserId, Viewer};
use crate::services::AuthError;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::validation(err.to_string()),
            AuthError::InvalidToken => Self::Unauthorized(err.to_string()),
            AuthError::Validation { field, message } => Self::field(&field, message),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the request [`Viewer`] from the token header and stores it as a
/// request extension. Requests without a token proceed anonymously; an
/// unknown token is rejected.
pub async fn resolve_viewer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let viewer = match extract_token(request.headers()) {
        None => Viewer::Anonymous,
        Some(token) => {
            let user = state.auth_service().resolve_token(&token).await?;
            tracing::Span::current().record("user_id", user.value());
            Viewer::User(user)
        }
    };

    request.extensions_mut().insert(viewer);
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Token <key>` or `Bearer <key>`.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

/// The authenticated user, or 401 for anonymous viewers.
pub fn require_user(viewer: Viewer) -> Result<UserId, ApiError> {
    viewer.user_id().ok_or_else(ApiError::unauthorized)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/token/login
/// Exchange email and password for the user's auth token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenDto>, ApiError> {
    let email = payload
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::field("email", "This field is required"))?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::field("password", "This field is required"))?;

    let token = state
        .auth_service()
        .login(email.trim(), &password)
        .await?;

    Ok(Json(TokenDto { auth_token: token }))
}

/// POST /auth/token/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<StatusCode, ApiError> {
    let user = require_user(viewer)?;
    state.auth_service().logout(user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc123"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(extract_token(&headers), None);
    }
}
