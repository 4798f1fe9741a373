//! Health aggregation against the in-memory backend.

use recipebox_core::health::{check_health, CheckStatus, OverallStatus, SENTINEL_TABLE};
use recipebox_core::remote::{AuthApi, Backend, BackendState, Database, SessionEvents};
use recipebox_core::{EnvironmentCheck, FakeBackend, FakeOp};

fn environment(configured: bool) -> EnvironmentCheck {
    EnvironmentCheck {
        supabase_url: configured,
        supabase_anon_key: configured,
        service_role_key: false,
        app_env: "test".to_string(),
    }
}

#[tokio::test]
async fn test_unconfigured_environment_reports_not_configured() {
    let report = check_health(environment(false), BackendState::NotConfigured).await;

    assert_eq!(report.status, OverallStatus::NotConfigured);
    assert_eq!(report.http_status_code(), 200);
    let checks = report.checks.unwrap();
    assert_eq!(checks.database.status, CheckStatus::NotConfigured);
    assert_eq!(checks.auth.status, CheckStatus::NotConfigured);
    assert!(checks.database.error.unwrap().contains("SUPABASE_URL"));
}

#[tokio::test]
async fn test_partial_configuration_skips_remote_checks() {
    let backend = FakeBackend::with_recipe_schema();
    let mut env = environment(true);
    env.supabase_anon_key = false;

    let report = check_health(env, BackendState::ready(backend.clone())).await;

    assert_eq!(report.status, OverallStatus::NotConfigured);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_reachable_services_are_healthy() {
    let backend = FakeBackend::with_recipe_schema();
    let report = check_health(environment(true), BackendState::ready(backend.clone())).await;

    assert_eq!(report.status, OverallStatus::Healthy);
    assert_eq!(report.http_status_code(), 200);
    assert_eq!(report.message, "All services are operating normally");
    assert!(report.response_time.ends_with("ms"));
    let checks = report.checks.unwrap();
    assert_eq!(checks.database.status, CheckStatus::Ok);
    assert_eq!(checks.database.error, None);
    assert_eq!(checks.auth.status, CheckStatus::Ok);
    assert_eq!(checks.runtime.mode, "test");
    assert_eq!(
        backend.calls(),
        vec![format!("select {}", SENTINEL_TABLE), "auth get_session".to_string()]
    );
}

#[tokio::test]
async fn test_auth_failure_degrades() {
    let backend = FakeBackend::with_recipe_schema();
    backend.fail_auth("Auth service unavailable");

    let report = check_health(environment(true), BackendState::ready(backend)).await;

    assert_eq!(report.status, OverallStatus::Degraded);
    assert_eq!(report.http_status_code(), 200);
    let checks = report.checks.unwrap();
    assert_eq!(checks.database.status, CheckStatus::Ok);
    assert_eq!(checks.auth.status, CheckStatus::Error);
    assert_eq!(checks.auth.error.as_deref(), Some("Auth service unavailable"));
}

#[tokio::test]
async fn test_database_failure_degrades() {
    let backend = FakeBackend::with_recipe_schema();
    backend.fail_on(FakeOp::Select, SENTINEL_TABLE, "Invalid API key");

    let report = check_health(environment(true), BackendState::ready(backend)).await;

    assert_eq!(report.status, OverallStatus::Degraded);
    let checks = report.checks.unwrap();
    assert_eq!(checks.database.status, CheckStatus::Error);
    assert_eq!(checks.database.error.as_deref(), Some("Invalid API key"));
    assert_eq!(checks.auth.status, CheckStatus::Ok);
}

#[tokio::test]
async fn test_missing_sentinel_message_counts_as_ok() {
    let backend = FakeBackend::with_recipe_schema();
    backend.create_table(SENTINEL_TABLE);
    backend.fail_on(
        FakeOp::Select,
        SENTINEL_TABLE,
        r#"relation "_health_check_dummy" does not exist"#,
    );

    let report = check_health(environment(true), BackendState::ready(backend)).await;

    assert_eq!(report.status, OverallStatus::Healthy);
    assert_eq!(report.checks.unwrap().database.status, CheckStatus::Ok);
}

#[tokio::test]
async fn test_client_construction_failure_errors_both_checks() {
    let report = check_health(
        environment(true),
        BackendState::Failed("Invalid service URL: relative URL without a base".to_string()),
    )
    .await;

    assert_eq!(report.status, OverallStatus::Degraded);
    let checks = report.checks.unwrap();
    assert_eq!(checks.database.status, CheckStatus::Error);
    assert_eq!(checks.auth.status, CheckStatus::Error);
    assert_eq!(checks.database.error, checks.auth.error);
}

#[derive(Debug, Default)]
struct ExplodingBackend {
    inner: FakeBackend,
}

impl Backend for ExplodingBackend {
    fn auth(&self) -> &dyn AuthApi {
        &self.inner
    }

    fn database(&self, _access_token: Option<&str>) -> Box<dyn Database> {
        panic!("database client exploded")
    }

    fn events(&self) -> &SessionEvents {
        self.inner.events()
    }

    fn name(&self) -> &'static str {
        "exploding"
    }
}

#[tokio::test]
async fn test_panic_during_aggregation_is_unhealthy() {
    let report = check_health(
        environment(true),
        BackendState::ready(ExplodingBackend::default()),
    )
    .await;

    assert_eq!(report.status, OverallStatus::Unhealthy);
    assert_eq!(report.http_status_code(), 500);
    assert!(report.checks.is_none());
    assert_eq!(report.error.as_deref(), Some("database client exploded"));
    assert!(report.response_time.ends_with("ms"));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("checks").is_none());
    assert_eq!(json["template"]["name"], "recipebox");
}
