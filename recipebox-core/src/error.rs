use thiserror::Error;

/// Failure talking to the hosted database/auth service.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Service not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Error payload returned by the service (PostgREST or GoTrue).
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteError {
    /// Machine-readable error code reported by the service, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            RemoteError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Failure of a recipe flow (create, update, delete, read).
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Recipe not found")]
    NotFound,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl RecipeError {
    pub fn validation(message: impl Into<String>) -> Self {
        RecipeError::Validation(message.into())
    }
}
