pub mod account;
pub mod categories;
pub mod health;
pub mod public;
pub mod recipes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recipebox_core::{RecipeError, RemoteError};
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failure mapped onto a status code and an [`ErrorResponse`].
#[derive(Debug)]
pub enum ApiError {
    NotConfigured,
    Unauthenticated,
    Forbidden,
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    /// Classify a service error the way read endpoints report it: auth and
    /// permission problems keep their meaning, other service messages are
    /// passed through as bad requests.
    pub fn from_remote(error: RemoteError) -> Self {
        match error {
            RemoteError::NotConfigured(_) => ApiError::NotConfigured,
            RemoteError::Api { code, message, .. } => {
                let code = code.unwrap_or_default();
                if code == "PGRST301" || message.contains("JWT") {
                    ApiError::Unauthenticated
                } else if code.starts_with("42501") || message.contains("permission") {
                    ApiError::Forbidden
                } else if code == "PGRST116" {
                    ApiError::NotFound("Not found".to_string())
                } else {
                    ApiError::BadRequest(message)
                }
            }
            other => ApiError::Internal(other.to_string()),
        }
    }

    pub fn from_read(error: RecipeError) -> Self {
        match error {
            RecipeError::Unauthenticated => ApiError::Unauthenticated,
            RecipeError::Validation(message) => ApiError::BadRequest(message),
            RecipeError::NotFound => ApiError::NotFound("Recipe not found".to_string()),
            RecipeError::Remote(e) => {
                tracing::warn!("Service read failed: {}", e);
                ApiError::from_remote(e)
            }
        }
    }

    /// Saves and deletes hide service detail behind `failure`.
    pub fn from_write(error: RecipeError, failure: &str) -> Self {
        match error {
            RecipeError::Unauthenticated => ApiError::Unauthenticated,
            RecipeError::Validation(message) => ApiError::BadRequest(message),
            RecipeError::NotFound => ApiError::NotFound("Recipe not found".to_string()),
            RecipeError::Remote(RemoteError::NotConfigured(_)) => ApiError::NotConfigured,
            RecipeError::Remote(e) => {
                tracing::error!("{}: {}", failure, e);
                ApiError::Internal(failure.to_string())
            }
        }
    }
}

impl From<RemoteError> for ApiError {
    fn from(error: RemoteError) -> Self {
        ApiError::from_remote(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service is not configured; set SUPABASE_URL and SUPABASE_ANON_KEY".to_string(),
            ),
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "recipebox", description = "Recipe management API"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        health::ApiDoc::openapi(),
        public::ApiDoc::openapi(),
        account::ApiDoc::openapi(),
        categories::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
