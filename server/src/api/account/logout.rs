use crate::api::{ApiError, ErrorResponse};
use crate::auth::{clear_cookie, AuthUser, ACCESS_TOKEN_COOKIE};
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let backend = state.backend.backend()?;

    // The local cookie is cleared even if the service could not revoke the token.
    if let Err(e) = backend.auth().sign_out(&auth.access_token).await {
        tracing::warn!("Sign out of user {} failed: {}", auth.user.id, e);
    }

    let mut headers = HeaderMap::new();
    if let Some(cookie) = clear_cookie(ACCESS_TOKEN_COOKIE, state.config.cookie_secure) {
        headers.insert(header::SET_COOKIE, cookie);
    }

    Ok((StatusCode::NO_CONTENT, headers))
}
