//! Object storage abstractions.
//!
//! Object storage is the only bus between pipeline stages: each stage reads
//! its inputs from and writes its outputs to well-known keys under three
//! logical "folders":
//!
//! ```text
//! {prefix}/input/        # raw daily drops and stage artifacts
//! {prefix}/wrk/          # per-supplier order files awaiting mail
//! {prefix}/zip-archive/  # timestamped processed originals (30-day retention)
//! ```

pub mod local;
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};

// Re-export for convenience
pub use local::LocalStore;
pub use s3::S3Store;

/// Well-known file names under the `input/` folder.
pub mod files {
    /// Supplier delivery schedule
    pub const SCHEDULE: &str = "cadentar.csv";
    /// Mailing list (supplier, addresses, auto-send flag)
    pub const MAILING_LIST: &str = "emails.csv";
    /// Raw supplier name mapping as maintained by the business side
    pub const RAW_MAPPING: &str = "supplier_mapping.csv";
    /// Normalized two-column dictionary produced by the converter
    pub const DICTIONARY: &str = "dict_suppliers.csv";
    /// Scraped minimum-order-quantity table
    pub const MOV: &str = "mov_data.csv";
    /// Bulk purchase-order archive downloaded from the portal
    pub const BULK_ARCHIVE: &str = "bulk_po.zip";
    /// Pack-size sheet used for box/unit conversion
    pub const PACK_SIZES: &str = "pack_sizes.csv";
    /// The dispatch table
    pub const MAIL_BAG: &str = "mail_bag.json";
    /// The assembler's discrepancy report
    pub const REPORT: &str = "data.json";
}

/// Key construction for the pipeline's folder layout.
#[derive(Debug, Clone)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn input(&self, name: &str) -> String {
        format!("{}/input/{}", self.prefix, name)
    }

    pub fn wrk(&self, name: &str) -> String {
        format!("{}/wrk/{}", self.prefix, name)
    }

    pub fn archive(&self, name: &str) -> String {
        format!("{}/zip-archive/{}", self.prefix, name)
    }

    pub fn input_prefix(&self) -> String {
        format!("{}/input/", self.prefix)
    }

    pub fn wrk_prefix(&self) -> String {
        format!("{}/wrk/", self.prefix)
    }

    pub fn archive_prefix(&self) -> String {
        format!("{}/zip-archive/", self.prefix)
    }
}

/// A stored object's key and modification time.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Backend-agnostic object storage used by every pipeline stage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object, `None` if the key does not exist.
    async fn get_optional(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object, overwriting any existing one.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// List objects under a key prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Read an object, failing if the key does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.get_optional(key).await?.ok_or_else(|| {
            AppError::dependency("object store", format!("no such key: {key}"))
        })
    }

    /// Server-side copy where the backend supports it; read+write otherwise.
    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let bytes = self.get(from).await?;
        self.put(to, bytes).await
    }
}

/// File name portion of a key (empty for "folder" placeholder keys).
pub fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_folder_layout() {
        let keys = Keys::new("purchasing-orders");
        assert_eq!(
            keys.input(files::MAIL_BAG),
            "purchasing-orders/input/mail_bag.json"
        );
        assert_eq!(keys.wrk("a.csv"), "purchasing-orders/wrk/a.csv");
        assert_eq!(keys.archive_prefix(), "purchasing-orders/zip-archive/");
    }

    #[test]
    fn base_name_strips_the_prefix() {
        assert_eq!(base_name("purchasing-orders/wrk/a.csv"), "a.csv");
        assert_eq!(base_name("purchasing-orders/wrk/"), "");
        assert_eq!(base_name("plain.csv"), "plain.csv");
    }
}
