use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use recipebox_core::User;

use super::cookies::{read_cookie, ACCESS_TOKEN_COOKIE};

/// Extractor that resolves the caller's access token to a user.
///
/// The token comes from `Authorization: Bearer <token>` or, failing that, the
/// access-token cookie set by the auth callback:
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> impl IntoResponse {
///     // auth.user is the signed-in user, auth.access_token scopes table access
/// }
/// ```
pub struct AuthUser {
    pub user: User,
    pub access_token: String,
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
    NotConfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidHeader => (StatusCode::UNAUTHORIZED, "Invalid Authorization header"),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication service is not configured",
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

fn access_token(parts: &Parts) -> Result<String, AuthError> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;
        return Ok(token.to_string());
    }

    read_cookie(&parts.headers, ACCESS_TOKEN_COOKIE).ok_or(AuthError::MissingToken)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let access_token = access_token(parts)?;

        let backend = state
            .backend
            .backend()
            .map_err(|_| AuthError::NotConfigured)?;

        let user = match backend.auth().get_user(&access_token).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthError::InvalidToken),
            Err(e) => {
                tracing::warn!("Failed to resolve access token: {}", e);
                return Err(AuthError::InvalidToken);
            }
        };

        Ok(AuthUser { user, access_token })
    }
}
