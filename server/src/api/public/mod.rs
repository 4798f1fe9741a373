pub mod auth;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/magic-link", post(auth::magic_link::magic_link))
        .route("/auth/callback", get(auth::callback::callback))
}

#[derive(OpenApi)]
#[openapi(
    paths(auth::magic_link::magic_link, auth::callback::callback),
    components(schemas(
        auth::magic_link::MagicLinkRequest,
        auth::magic_link::MagicLinkResponse,
    ))
)]
pub struct ApiDoc;
