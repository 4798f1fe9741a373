pub mod list;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use recipebox_core::Category;
use utoipa::OpenApi;

/// Returns the router for /api/categories endpoints (mounted at /api/categories)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list::list_categories))
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_categories),
    components(schemas(list::CategoriesResponse, Category))
)]
pub struct ApiDoc;
