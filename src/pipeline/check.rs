//! Health probe against the portal's backend.

use serde_json::Value;
use tracing::info;

use crate::config::Settings;
use crate::error::{AppError, Result};

/// Hit the backend health endpoint and return its JSON body.
pub async fn run(settings: &Settings) -> Result<Value> {
    let response = reqwest::get(&settings.health_url)
        .await
        .map_err(|e| AppError::dependency("health check", e))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| AppError::dependency("health check", e))?;

    info!("health endpoint replied with {status}");
    Ok(body)
}
