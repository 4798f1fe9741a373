use super::create::SaveRecipeResponse;
use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use recipebox_core::recipes::{self, RecipeForm};
use uuid::Uuid;

/// Replaces the recipe's fields, ingredients and instructions. Steps are not
/// transactional: a failure part-way leaves the earlier steps applied.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeForm,
    responses(
        (status = 200, description = "Recipe updated successfully", body = SaveRecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Recipe could not be saved", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<RecipeForm>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to update recipe";

    let draft = form
        .validate()
        .map_err(|e| ApiError::from_write(e, FAILURE))?;
    let db = state.backend.backend()?.database(Some(&auth.access_token));

    let id = recipes::save_recipe(db.as_ref(), Some(&auth.user), Some(id), &draft)
        .await
        .map_err(|e| ApiError::from_write(e, FAILURE))?;

    Ok(Json(SaveRecipeResponse { id }))
}
