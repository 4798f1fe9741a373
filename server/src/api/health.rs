use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use recipebox_core::health::{
    check_health, CheckStatus, HealthChecks, HealthReport, OverallStatus, RuntimeInfo,
    ServiceCheck, TemplateInfo,
};
use recipebox_core::EnvironmentCheck;
use utoipa::OpenApi;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(get_health))
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Healthy, degraded or not configured", body = HealthReport),
        (status = 500, description = "Unhealthy", body = HealthReport)
    )
)]
pub async fn get_health(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_health(state.config.environment_check(), state.backend.clone()).await;
    let status = StatusCode::from_u16(report.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Json(report))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_health),
    components(schemas(
        HealthReport,
        HealthChecks,
        ServiceCheck,
        CheckStatus,
        OverallStatus,
        RuntimeInfo,
        TemplateInfo,
        EnvironmentCheck,
    ))
)]
pub struct ApiDoc;
