use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use recipebox_core::recipes::{self, RecipeForm};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaveRecipeResponse {
    pub id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = RecipeForm,
    responses(
        (status = 201, description = "Recipe created successfully", body = SaveRecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Recipe could not be saved", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<RecipeForm>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to create recipe";

    let draft = form
        .validate()
        .map_err(|e| ApiError::from_write(e, FAILURE))?;
    let db = state.backend.backend()?.database(Some(&auth.access_token));

    let id = recipes::save_recipe(db.as_ref(), Some(&auth.user), None, &draft)
        .await
        .map_err(|e| ApiError::from_write(e, FAILURE))?;

    Ok((StatusCode::CREATED, Json(SaveRecipeResponse { id })))
}
