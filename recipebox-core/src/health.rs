//! Health aggregation: configuration presence plus two remote probes, merged
//! into one overall status.

use crate::config::EnvironmentCheck;
use crate::remote::{Backend, BackendState, Select};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::any::Any;
use std::time::Instant;

/// Table that is expected not to exist. Reading it proves the database answers.
pub const SENTINEL_TABLE: &str = "_health_check_dummy";

const TEMPLATE_NAME: &str = "recipebox";
const TEMPLATE_PHASE: &str = "Phase 0 - Template Complete";

const NOT_CONFIGURED_GUIDANCE: &str =
    "Environment variables are not set. Check SUPABASE_URL and SUPABASE_ANON_KEY.";
const CLIENT_MISSING: &str = "Service client is not initialized";
const SYSTEM_ERROR: &str = "A system error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Unknown,
    Ok,
    Error,
    NotConfigured,
}

/// Result of one probe. `error` is serialized as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceCheck {
    pub status: CheckStatus,
    pub error: Option<String>,
}

impl ServiceCheck {
    pub fn unknown() -> Self {
        Self {
            status: CheckStatus::Unknown,
            error: None,
        }
    }

    pub fn ok() -> Self {
        Self {
            status: CheckStatus::Ok,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Error,
            error: Some(message.into()),
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::NotConfigured,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
    NotConfigured,
}

impl OverallStatus {
    pub fn message(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "All services are operating normally",
            OverallStatus::Degraded => {
                "Some services are reporting problems; core features remain available"
            }
            OverallStatus::Unhealthy => "The system is experiencing a critical problem",
            OverallStatus::NotConfigured => {
                "Environment configuration required; set SUPABASE_URL and SUPABASE_ANON_KEY"
            }
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            OverallStatus::Unhealthy => 500,
            _ => 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuntimeInfo {
    pub status: String,
    pub version: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthChecks {
    /// RFC 3339 time the checks started.
    pub timestamp: String,
    pub environment: EnvironmentCheck,
    #[serde(rename = "nextjs")]
    pub runtime: RuntimeInfo,
    pub database: ServiceCheck,
    pub auth: ServiceCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TemplateInfo {
    pub name: String,
    pub version: String,
    pub phase: String,
}

impl Default for TemplateInfo {
    fn default() -> Self {
        Self {
            name: TEMPLATE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            phase: TEMPLATE_PHASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: OverallStatus,
    pub message: String,
    /// Aggregation latency, e.g. `"12ms"`.
    pub response_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub template: TemplateInfo,
}

impl HealthReport {
    pub fn http_status_code(&self) -> u16 {
        self.status.http_status_code()
    }
}

/// Merge configuration presence and probe results, first match wins:
/// unresolved probe, missing public value, any probe error, otherwise healthy.
pub fn derive_overall_status(
    environment: &EnvironmentCheck,
    database: &ServiceCheck,
    auth: &ServiceCheck,
) -> OverallStatus {
    if [database, auth]
        .iter()
        .any(|check| check.status == CheckStatus::Unknown)
    {
        OverallStatus::Unhealthy
    } else if !environment.public_values_present() {
        OverallStatus::NotConfigured
    } else if [database, auth]
        .iter()
        .any(|check| check.status == CheckStatus::Error)
    {
        OverallStatus::Degraded
    } else {
        OverallStatus::Healthy
    }
}

/// Whether a failed sentinel read only says the sentinel table is absent.
pub fn is_missing_sentinel(error: &crate::error::RemoteError) -> bool {
    let missing = format!("relation \"{}\" does not exist", SENTINEL_TABLE);
    error.to_string().contains(&missing) || matches!(error.code(), Some("42P01" | "PGRST205"))
}

/// Run the database and auth probes against a constructed backend.
pub async fn probe_services(backend: &dyn Backend) -> (ServiceCheck, ServiceCheck) {
    let query = Select::from(SENTINEL_TABLE).columns(&["count"]).limit(1);
    let database = match backend.database(None).select(&query).await {
        Ok(_) => ServiceCheck::ok(),
        Err(e) if is_missing_sentinel(&e) => ServiceCheck::ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            ServiceCheck::error(e.to_string())
        }
    };

    let auth = match backend.auth().get_session(None).await {
        Ok(_) => ServiceCheck::ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Auth health probe failed");
            ServiceCheck::error(e.to_string())
        }
    };

    (database, auth)
}

async fn collect_checks(environment: EnvironmentCheck, backend: BackendState) -> HealthChecks {
    let mut checks = HealthChecks {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        runtime: RuntimeInfo {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: environment.app_env.clone(),
        },
        environment,
        database: ServiceCheck::unknown(),
        auth: ServiceCheck::unknown(),
    };

    if !checks.environment.public_values_present() {
        checks.database = ServiceCheck::not_configured(NOT_CONFIGURED_GUIDANCE);
        checks.auth = ServiceCheck::not_configured(NOT_CONFIGURED_GUIDANCE);
        return checks;
    }

    let (database, auth) = match &backend {
        BackendState::Ready(backend) => probe_services(backend.as_ref()).await,
        BackendState::Failed(message) => {
            (ServiceCheck::error(message), ServiceCheck::error(message))
        }
        BackendState::NotConfigured => (
            ServiceCheck::error(CLIENT_MISSING),
            ServiceCheck::error(CLIENT_MISSING),
        ),
    };
    checks.database = database;
    checks.auth = auth;
    checks
}

/// Aggregate a health report. Never fails: a panic during aggregation is
/// reported as `unhealthy` with the panic message and no checks.
pub async fn check_health(environment: EnvironmentCheck, backend: BackendState) -> HealthReport {
    let start = Instant::now();
    let outcome = tokio::spawn(collect_checks(environment, backend)).await;
    let response_time = format!("{}ms", start.elapsed().as_millis());

    match outcome {
        Ok(checks) => {
            let status = derive_overall_status(&checks.environment, &checks.database, &checks.auth);
            tracing::debug!(?status, %response_time, "Health checks complete");
            HealthReport {
                status,
                message: status.message().to_string(),
                response_time,
                checks: Some(checks),
                error: None,
                template: TemplateInfo::default(),
            }
        }
        Err(e) => {
            let error = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            tracing::error!(%error, "Health aggregation failed");
            HealthReport {
                status: OverallStatus::Unhealthy,
                message: SYSTEM_ERROR.to_string(),
                response_time,
                checks: None,
                error: Some(error),
                template: TemplateInfo::default(),
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown error".to_string()
    }
}
