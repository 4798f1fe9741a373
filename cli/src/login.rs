use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct MagicLinkResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

pub async fn login(server: &str, email: &str) -> Result<()> {
    let url = format!("{}/api/auth/magic-link", server.trim_end_matches('/'));

    let response = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "email": email }))
        .send()
        .await
        .context("Failed to send magic link request")?;

    if !response.status().is_success() {
        let status = response.status();
        let error = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_default();
        anyhow::bail!("Magic link request failed with status {}: {}", status, error);
    }

    let body: MagicLinkResponse = response
        .json()
        .await
        .context("Failed to read response body")?;
    println!("{}", body.message);

    Ok(())
}
