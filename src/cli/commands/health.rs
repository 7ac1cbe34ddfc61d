use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use url::Url;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// `<base>/health`, keeping any path prefix the base already has
pub fn health_url(base: &str) -> anyhow::Result<Url> {
    let mut base = Url::parse(base).with_context(|| format!("invalid server URL: {}", base))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("health").context("failed to build health URL")
}

pub async fn handle(base: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = health_url(base)?;
    let client = reqwest::Client::new();

    let response = match client.get(url.clone()).timeout(Duration::from_secs(5)).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(&output_format, &format!("{} unreachable: {}", url, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server unreachable");
        }
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(&output_format, &format!("{} is healthy", base), Some(body))
    } else {
        let detail = body["database"]["error"].as_str().unwrap_or("unknown error");
        output_error(
            &output_format,
            &format!("{} is unhealthy ({}): {}", base, status, detail),
            Some("UNHEALTHY"),
        )?;
        anyhow::bail!("server unhealthy")
    }
}
