//! Minimum-order-quantity (MOV) data scraped from the portal.

use std::collections::BTreeSet;

use crate::error::{AppError, Result};

/// One `(supplier, store)` MOV observation. A supplier appears once per
/// store; "meets minimum" is a per-store verdict, not a global one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovRecord {
    pub supplier: String,
    pub store: String,
    pub has_mov: bool,
    pub mov: String,
}

impl MovRecord {
    /// Parse the headerless MOV CSV written by the scraper. Supplier names
    /// come straight out of the portal DOM, so HTML entities are decoded and
    /// whitespace trimmed here.
    pub fn read_csv(bytes: &[u8]) -> Result<Vec<MovRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes);

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| AppError::structural("mov", e))?;
            if record.len() < 4 {
                return Err(AppError::structural(
                    "mov",
                    format!("expected 4 columns, got {}", record.len()),
                ));
            }
            let supplier = html_escape::decode_html_entities(record[0].trim()).into_owned();
            records.push(MovRecord {
                supplier,
                store: record[1].trim().to_string(),
                has_mov: record[2].trim().eq_ignore_ascii_case("true"),
                mov: record[3].to_string(),
            });
        }
        Ok(records)
    }

    /// Serialize records back to the headerless CSV wire shape.
    pub fn write_csv(records: &[MovRecord]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for record in records {
            writer.write_record([
                record.supplier.as_str(),
                record.store.as_str(),
                if record.has_mov { "true" } else { "false" },
                record.mov.as_str(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::structural("mov", e))
    }
}

/// Per-supplier MOV compliance, aggregated over stores.
#[derive(Debug, Clone, Default)]
pub struct MovPartition {
    /// Suppliers with at least one store below minimum; excluded from dispatch
    pub not_in_mov: Vec<String>,

    /// Subset of `not_in_mov` that also has a compliant store (mixed verdict)
    pub both_mov: Vec<String>,

    /// Every supplier with any MOV observation at all
    pub known_suppliers: BTreeSet<String>,
}

impl MovPartition {
    /// Partition suppliers by minimum-quantity status. A single store-level
    /// failure puts the supplier in `not_in_mov`; a supplier is never
    /// partially shipped.
    pub fn from_records(records: &[MovRecord]) -> Self {
        let mut failing: BTreeSet<&str> = BTreeSet::new();
        let mut passing: BTreeSet<&str> = BTreeSet::new();
        let mut known = BTreeSet::new();

        for record in records {
            known.insert(record.supplier.clone());
            if record.has_mov {
                passing.insert(&record.supplier);
            } else {
                failing.insert(&record.supplier);
            }
        }

        let not_in_mov: Vec<String> = failing.iter().map(|s| s.to_string()).collect();
        let both_mov = failing
            .iter()
            .filter(|s| passing.contains(*s))
            .map(|s| s.to_string())
            .collect();

        Self {
            not_in_mov,
            both_mov,
            known_suppliers: known,
        }
    }

    pub fn is_blocked(&self, supplier: &str) -> bool {
        self.not_in_mov.iter().any(|s| s == supplier)
    }
}
