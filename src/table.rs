// src/table.rs

//! Header-indexed CSV tables.
//!
//! The per-supplier mutators rewrite order files column-wise (rename, drop,
//! derive, reorder). This module keeps those edits out of the business code.

use std::io;

use crate::error::{AppError, Result};

/// An in-memory delimited table with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV bytes. The first record is the header row.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(bytes)
    }

    pub fn from_reader(reader: impl io::Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            // flexible parsing may yield short rows; pad to header width
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Serialize back to CSV bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::structural("table", e))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| AppError::structural("table", format!("missing column: {name}")))
    }

    /// Cell value by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// Rename a column in place. Missing source column is a structural error.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let index = self.require_column(from)?;
        self.headers[index] = to.to_string();
        Ok(())
    }

    /// Drop the named columns. Every name must exist.
    pub fn drop_columns(&mut self, names: &[&str]) -> Result<()> {
        let mut indices = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable_by(|a, b| b.cmp(a));

        for index in indices {
            self.headers.remove(index);
            for row in &mut self.rows {
                row.remove(index);
            }
        }
        Ok(())
    }

    /// Append a column filled with a constant value.
    pub fn add_column(&mut self, name: &str, value: &str) {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
    }

    /// Rewrite every cell of a column through `f`.
    pub fn map_column(&mut self, name: &str, mut f: impl FnMut(&str) -> Result<String>) -> Result<()> {
        let index = self.require_column(name)?;
        for row in &mut self.rows {
            row[index] = f(&row[index])?;
        }
        Ok(())
    }

    /// Project and reorder columns to exactly the given list.
    pub fn select(&mut self, order: &[&str]) -> Result<()> {
        let indices = order
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>>>()?;

        self.headers = order.iter().map(|s| s.to_string()).collect();
        for row in &mut self.rows {
            *row = indices.iter().map(|&i| row[i].clone()).collect();
        }
        Ok(())
    }

    /// Raw row access, header order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Mutable row access for edits spanning more than one column.
    pub fn rows_mut(&mut self) -> &mut [Vec<String>] {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
PO #,Plan Qty,Supplier SKU,Store Name
PO-1,12,7,Store A
PO-2,3,42,Store B
";

    #[test]
    fn parse_and_serialize_round_trip() {
        let table = Table::from_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Plan Qty"), Some("12"));

        let bytes = table.to_bytes().unwrap();
        let back = Table::from_bytes(&bytes).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn rename_drop_add_select() {
        let mut table = Table::from_bytes(CSV.as_bytes()).unwrap();
        table.rename_column("PO #", "Cod comanda").unwrap();
        table.drop_columns(&["Store Name"]).unwrap();
        table.add_column("Cod Client", "Bolt 03");
        table
            .select(&["Cod Client", "Cod comanda", "Plan Qty", "Supplier SKU"])
            .unwrap();

        assert_eq!(
            table.headers(),
            ["Cod Client", "Cod comanda", "Plan Qty", "Supplier SKU"]
        );
        assert_eq!(table.get(1, "Cod Client"), Some("Bolt 03"));
        assert_eq!(table.get(1, "Cod comanda"), Some("PO-2"));
    }

    #[test]
    fn map_column_applies_and_propagates_errors() {
        let mut table = Table::from_bytes(CSV.as_bytes()).unwrap();
        table
            .map_column("Supplier SKU", |v| Ok(format!("{:0>6}", v)))
            .unwrap();
        assert_eq!(table.get(0, "Supplier SKU"), Some("000007"));

        let err = table.map_column("Missing", |v| Ok(v.to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn missing_column_is_structural() {
        let mut table = Table::from_bytes(CSV.as_bytes()).unwrap();
        assert!(table.rename_column("Nope", "X").is_err());
        assert!(table.drop_columns(&["Nope"]).is_err());
    }
}
