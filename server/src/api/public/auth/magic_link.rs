use crate::api::{ApiError, ErrorResponse};
use crate::auth::{set_cookie, CODE_VERIFIER_COOKIE, CODE_VERIFIER_MAX_AGE};
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MagicLinkResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/magic-link",
    tag = "auth",
    request_body(content = MagicLinkRequest, example = json!({"email": "cook@example.com"})),
    responses(
        (status = 200, description = "Magic link sent", body = MagicLinkResponse),
        (status = 400, description = "Invalid email or rejected by the auth service", body = ErrorResponse),
        (status = 503, description = "Service not configured", body = ErrorResponse)
    )
)]
pub async fn magic_link(
    State(state): State<AppState>,
    Json(req): Json<MagicLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let backend = state.backend.backend()?;
    let redirect_url = format!("{}/auth/callback", state.config.site_url);

    let link = backend
        .auth()
        .sign_in_with_magic_link(email, &redirect_url)
        .await
        .map_err(|e| {
            tracing::warn!("Magic link request failed: {}", e);
            ApiError::from_remote(e)
        })?;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = set_cookie(
        CODE_VERIFIER_COOKIE,
        &link.code_verifier,
        CODE_VERIFIER_MAX_AGE,
        state.config.cookie_secure,
    ) {
        headers.insert(header::SET_COOKIE, cookie);
    }

    tracing::info!("Magic link requested with callback {}", redirect_url);

    Ok((
        StatusCode::OK,
        headers,
        Json(MagicLinkResponse {
            message: "Magic link sent. Check your email to sign in.".to_string(),
        }),
    ))
}
