//! The mail bag: per-supplier dispatch plan for one day's send.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One supplier's dispatch entry. Built once by the assembler, then mutated
/// in place by both mutator passes before the mailer consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRow {
    /// Supplier name, warehouse-system spelling
    pub supplier: String,

    /// Order file names attached to the supplier's message, sorted
    pub files: Vec<String>,

    /// Recipient addresses from the mailing list
    pub addresses: Vec<String>,

    /// Auto-send enable flag from the mailing list
    pub is_green: bool,
}

/// The dispatch table persisted between stages as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailBag {
    pub rows: Vec<DispatchRow>,
}

impl MailBag {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize with stable formatting so unchanged inputs produce
    /// byte-identical output.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn row(&self, supplier: &str) -> Option<&DispatchRow> {
        self.rows.iter().find(|row| row.supplier == supplier)
    }

    pub fn row_mut(&mut self, supplier: &str) -> Option<&mut DispatchRow> {
        self.rows.iter_mut().find(|row| row.supplier == supplier)
    }

    /// Remove and return the first row for a supplier.
    pub fn remove(&mut self, supplier: &str) -> Option<DispatchRow> {
        let index = self.rows.iter().position(|row| row.supplier == supplier)?;
        Some(self.rows.remove(index))
    }

    pub fn push(&mut self, row: DispatchRow) {
        self.rows.push(row);
    }

    /// Rename a file in a supplier's row, keeping the in-memory list
    /// consistent with renames applied to the stored objects.
    pub fn rename_file(&mut self, supplier: &str, old_name: &str, new_name: &str) {
        if let Some(row) = self.row_mut(supplier) {
            for file in &mut row.files {
                if file == old_name {
                    *file = new_name.to_string();
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> DispatchRow {
        DispatchRow {
            supplier: "ACME-WMS".to_string(),
            files: vec!["ACME-WMS-Store1-PO-01-2024.csv".to_string()],
            addresses: vec!["orders@acme.example".to_string()],
            is_green: true,
        }
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let bag = MailBag {
            rows: vec![sample_row()],
        };
        let bytes = bag.to_json().unwrap();
        let back = MailBag::from_json(&bytes).unwrap();
        assert_eq!(back, bag);
    }

    #[test]
    fn serialization_is_deterministic() {
        let bag = MailBag {
            rows: vec![sample_row()],
        };
        assert_eq!(bag.to_json().unwrap(), bag.to_json().unwrap());
    }

    #[test]
    fn rename_file_updates_the_right_row() {
        let mut bag = MailBag {
            rows: vec![sample_row()],
        };
        bag.rename_file("ACME-WMS", "ACME-WMS-Store1-PO-01-2024.csv", "renamed.csv");
        assert_eq!(bag.row("ACME-WMS").unwrap().files, ["renamed.csv"]);

        // unknown supplier is a no-op
        bag.rename_file("NOBODY", "renamed.csv", "x.csv");
        assert_eq!(bag.row("ACME-WMS").unwrap().files, ["renamed.csv"]);
    }

    #[test]
    fn remove_returns_the_row() {
        let mut bag = MailBag {
            rows: vec![sample_row()],
        };
        let row = bag.remove("ACME-WMS").unwrap();
        assert_eq!(row.supplier, "ACME-WMS");
        assert!(bag.is_empty());
        assert!(bag.remove("ACME-WMS").is_none());
    }
}
