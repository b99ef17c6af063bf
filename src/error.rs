// src/error.rs

//! Unified error handling for the dispatch robot.
//!
//! Failures fall into three kinds: external dependencies (storage, secrets,
//! mail, the portal browser session), structural data problems (schema,
//! joins, naming conventions), and business-rule gaps (unmapped stores or
//! suppliers). No retries anywhere: every failure is reported once and the
//! invocation ends.

use std::fmt;

use thiserror::Error;

/// Result type alias for robot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// External dependency failed (S3, Secrets Manager, SMTP, WebDriver)
    #[error("dependency error in {context}: {message}")]
    Dependency { context: String, message: String },

    /// Input data did not have the expected shape
    #[error("structural error in {context}: {message}")]
    Structural { context: String, message: String },

    /// A hardcoded business rule has no answer for the input
    #[error("business rule violation: {0}")]
    BusinessRule(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Order archive could not be read
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl AppError {
    /// Create a dependency error with the failing operation as context.
    pub fn dependency(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Dependency {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a structural error with the failing step as context.
    pub fn structural(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Structural {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a business rule error.
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule(message.into())
    }
}
