pub mod logout;
pub mod me;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use recipebox_core::User;
use utoipa::OpenApi;

/// Returns the router for the signed-in user's own account
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me::me))
        .route("/api/auth/logout", post(logout::logout))
}

#[derive(OpenApi)]
#[openapi(paths(me::me, logout::logout), components(schemas(User)))]
pub struct ApiDoc;
