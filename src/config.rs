// src/config.rs

//! Runtime configuration and credentials.
//!
//! Everything a stage needs is built at startup and injected explicitly:
//! `Settings` come from environment variables with defaults, `Secrets` are
//! fetched from AWS Secrets Manager per invocation. No module-level globals.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, Result};

/// Runtime settings shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Object storage bucket holding all pipeline artifacts
    pub bucket: String,

    /// Key prefix under the bucket (the pipeline's "folder")
    pub prefix: String,

    /// Warehouse portal login URL
    pub portal_url: String,

    /// WebDriver endpoint the scraper connects to
    pub webdriver_url: String,

    /// SMTP relay host for outgoing mail
    pub smtp_host: String,

    /// Secrets Manager secret id holding portal and mail credentials
    pub secret_id: String,

    /// Portal backend health endpoint probed by the check stage
    pub health_url: String,

    /// Directory the browser downloads the order archive into
    pub download_dir: PathBuf,

    /// Maximum wait for a UI element to appear
    pub element_wait: Duration,

    /// Download polling: number of attempts
    pub download_attempts: u32,

    /// Download polling: sleep between attempts
    pub download_poll: Duration,

    /// Age in days after which archived artifacts are deleted
    pub archive_retention_days: i64,
}

impl Settings {
    /// Build settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let env = |key: &str, default: &str| {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Self {
            bucket: env("PO_BUCKET", "po-projects"),
            prefix: env("PO_PREFIX", "purchasing-orders"),
            portal_url: env("PORTAL_URL", "https://wms.example.com"),
            webdriver_url: env("WEBDRIVER_URL", "http://localhost:9515"),
            smtp_host: env("SMTP_HOST", "smtp.gmail.com"),
            secret_id: env("PO_SECRET_ID", "po-robot"),
            health_url: env(
                "HEALTH_URL",
                "http://localhost:8080/api/admin/check-health",
            ),
            download_dir: PathBuf::from(env("DOWNLOAD_DIR", "/tmp")),
            element_wait: Duration::from_secs(parse_env("ELEMENT_WAIT_SECS", 10)),
            download_attempts: parse_env("DOWNLOAD_ATTEMPTS", 10) as u32,
            download_poll: Duration::from_secs(parse_env("DOWNLOAD_POLL_SECS", 3)),
            archive_retention_days: parse_env("ARCHIVE_RETENTION_DAYS", 30) as i64,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_env(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Credentials for the portal and the mail relay.
#[derive(Debug, Clone, Deserialize)]
pub struct Secrets {
    #[serde(rename = "PORTAL_USER")]
    pub portal_user: String,
    #[serde(rename = "PORTAL_PASS")]
    pub portal_pass: String,
    #[serde(rename = "MAIL_SENDER")]
    pub mail_sender: String,
    #[serde(rename = "MAIL_PASSWORD")]
    pub mail_password: String,
}

/// Fetches the robot's secret bundle from AWS Secrets Manager.
pub struct SecretsLoader {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsLoader {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }

    /// Create a loader from the ambient AWS configuration.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_secretsmanager::Client::new(&config))
    }

    /// Fetch and parse the named secret.
    pub async fn load(&self, secret_id: &str) -> Result<Secrets> {
        info!("Fetching secret: {}", secret_id);
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| AppError::dependency("secrets manager", e))?;

        let raw = output
            .secret_string()
            .ok_or_else(|| AppError::dependency("secrets manager", "secret has no string value"))?;

        serde_json::from_str(raw)
            .map_err(|e| AppError::structural("secrets manager", format!("bad secret shape: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_parse_from_json_bundle() {
        let raw = r#"{
            "PORTAL_USER": "robot",
            "PORTAL_PASS": "hunter2",
            "MAIL_SENDER": "robot@example.com",
            "MAIL_PASSWORD": "app-pass"
        }"#;
        let secrets: Secrets = serde_json::from_str(raw).unwrap();
        assert_eq!(secrets.portal_user, "robot");
        assert_eq!(secrets.mail_sender, "robot@example.com");
    }

    #[test]
    fn settings_have_sane_defaults() {
        let settings = Settings::from_env();
        assert_eq!(settings.download_attempts, 10);
        assert_eq!(settings.download_poll, Duration::from_secs(3));
        assert_eq!(settings.archive_retention_days, 30);
    }
}
