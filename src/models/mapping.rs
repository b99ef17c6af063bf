//! Supplier name dictionary (schedule-system name → warehouse-system name).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Normalized two-column supplier lookup.
///
/// Names on both sides are trimmed; joins elsewhere rely on exact string
/// equality after trimming, so unmatched rows surface as "not in dictionary".
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawMapRecord {
    supplier_cad: String,
    supplier_wms: String,
}

impl NameMap {
    /// Parse the normalized dictionary CSV produced by the converter stage.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(bytes);
        let mut entries = BTreeMap::new();

        for record in reader.deserialize::<RawMapRecord>() {
            let record = record.map_err(|e| AppError::structural("dictionary", e))?;
            entries.insert(
                record.supplier_cad.trim().to_string(),
                record.supplier_wms.trim().to_string(),
            );
        }

        Ok(Self { entries })
    }

    /// Look up the warehouse-system spelling of a schedule-system name.
    pub fn lookup(&self, supplier_cad: &str) -> Option<&str> {
        self.entries.get(supplier_cad.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_trims_both_sides() {
        let csv = "supplier_cad,supplier_wms\n ACME , ACME-WMS \nBETA,BETA SRL\n";
        let map = NameMap::from_csv(csv.as_bytes()).unwrap();

        assert_eq!(map.lookup("ACME"), Some("ACME-WMS"));
        assert_eq!(map.lookup("  ACME  "), Some("ACME-WMS"));
        assert_eq!(map.lookup("GAMMA"), None);
    }

    #[test]
    fn duplicate_cad_names_keep_the_last_mapping() {
        let csv = "supplier_cad,supplier_wms\nACME,OLD\nACME,NEW\n";
        let map = NameMap::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup("ACME"), Some("NEW"));
    }
}
