use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct HealthSummary {
    status: String,
    message: String,
}

/// Whether a reported status counts as passing. A server that simply has no
/// service configured yet is not a failure.
fn is_passing(status: &str) -> bool {
    matches!(status, "healthy" | "not_configured")
}

/// Print the health report. Returns whether the status is passing.
pub async fn health(server: &str) -> Result<bool> {
    let url = format!("{}/api/health", server.trim_end_matches('/'));

    // 500 still carries a report, so the status code is not checked here
    let report: Value = reqwest::get(&url)
        .await
        .with_context(|| format!("Failed to reach {}", url))?
        .json()
        .await
        .context("Failed to parse health report")?;

    let summary: HealthSummary =
        serde_json::from_value(report.clone()).context("Unexpected health report shape")?;

    println!("{}: {}", summary.status, summary.message);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(is_passing(&summary.status))
}
