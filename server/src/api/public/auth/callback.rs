use crate::auth::{
    clear_cookie, read_cookie, set_cookie, ACCESS_TOKEN_COOKIE, CODE_VERIFIER_COOKIE,
    DEFAULT_SESSION_MAX_AGE,
};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use utoipa::IntoParams;

pub const DEFAULT_REDIRECT: &str = "/dashboard";

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackParams {
    /// One-time code from the magic link
    pub code: Option<String>,
    /// Site-relative path to continue to (default `/dashboard`)
    pub redirect_to: Option<String>,
}

/// Only same-site paths are followed; anything else falls back to the dashboard.
fn redirect_target(redirect_to: Option<&str>) -> &str {
    match redirect_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => DEFAULT_REDIRECT,
    }
}

#[utoipa::path(
    get,
    path = "/auth/callback",
    tag = "auth",
    params(CallbackParams),
    responses(
        (status = 303, description = "Redirect to `redirect_to`, with the session cookie set when the code was accepted")
    )
)]
pub async fn callback(
    State(state): State<AppState>,
    request_headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let secure = state.config.cookie_secure;
    let mut headers = HeaderMap::new();

    if let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) {
        let verifier = read_cookie(&request_headers, CODE_VERIFIER_COOKIE);
        match (state.backend.backend(), verifier) {
            (Ok(backend), Some(verifier)) => {
                match backend
                    .auth()
                    .exchange_code_for_session(code, &verifier)
                    .await
                {
                    Ok(session) => {
                        tracing::info!("User {} signed in", session.user.id);
                        let max_age = session.expires_in.unwrap_or(DEFAULT_SESSION_MAX_AGE);
                        if let Some(cookie) =
                            set_cookie(ACCESS_TOKEN_COOKIE, &session.access_token, max_age, secure)
                        {
                            headers.append(header::SET_COOKIE, cookie);
                        }
                    }
                    Err(e) => tracing::warn!("Code exchange failed: {}", e),
                }
            }
            (Err(e), _) => tracing::warn!("Cannot exchange code: {}", e),
            (Ok(_), None) => tracing::warn!("Cannot exchange code: no code verifier cookie"),
        }

        if let Some(cookie) = clear_cookie(CODE_VERIFIER_COOKIE, secure) {
            headers.append(header::SET_COOKIE, cookie);
        }
    }

    let target = redirect_target(params.redirect_to.as_deref());
    (headers, Redirect::to(target))
}
