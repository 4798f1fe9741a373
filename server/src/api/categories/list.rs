use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use recipebox_core::{recipes, Category};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Categories ordered by name", body = CategoriesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_categories(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.backend.backend()?.database(Some(&auth.access_token));

    let categories = recipes::list_categories(db.as_ref())
        .await
        .map_err(ApiError::from_read)?;

    Ok(Json(CategoriesResponse { categories }))
}
