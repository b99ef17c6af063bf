//! Supplier mailing list.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// A supplier's mail configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailingEntry {
    /// Recipient addresses, already split and trimmed
    pub addresses: Vec<String>,

    /// Auto-send flag ("da" in the source sheet)
    pub is_green: bool,
}

/// The mailing list, keyed by warehouse-system supplier name. Duplicate
/// rows keep the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct MailingList {
    entries: BTreeMap<String, MailingEntry>,
}

/// Wire shape of one mailing-list CSV record; headers as maintained by
/// the business side.
#[derive(Debug, Deserialize)]
struct RawMailRecord {
    #[serde(rename = "Supplier WMS")]
    supplier_wms: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Auto-send order?")]
    auto_send: String,
}

impl MailingList {
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(bytes);
        let mut entries = BTreeMap::new();

        for record in reader.deserialize::<RawMailRecord>() {
            let record = record.map_err(|e| AppError::structural("mailing list", e))?;
            let supplier = record.supplier_wms.trim().to_string();
            entries.entry(supplier).or_insert_with(|| MailingEntry {
                addresses: split_addresses(&record.email),
                is_green: record.auto_send.trim().eq_ignore_ascii_case("da"),
            });
        }

        Ok(Self { entries })
    }

    pub fn entry(&self, supplier_wms: &str) -> Option<&MailingEntry> {
        self.entries.get(supplier_wms.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A cell may carry several addresses separated by commas or semicolons.
fn split_addresses(cell: &str) -> Vec<String> {
    cell.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
