//! Bulk order archive handling.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::Result;

/// List the file names inside a zip archive, skipping directory entries.
pub fn file_names(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if !entry.is_dir() {
            names.push(entry.name().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Read every file entry into memory, keyed by entry name.
pub fn read_entries(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        entries.insert(entry.name().to_string(), contents);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn sample_zip() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer
            .start_file("BETA SRL-Store A-PO-01-2024.csv", options)
            .unwrap();
        writer.write_all(b"PO #,Plan Qty\nPO-1,3\n").unwrap();
        writer
            .start_file("ACME-WMS-Store1-PO-01-2024.csv", options)
            .unwrap();
        writer.write_all(b"PO #,Plan Qty\nPO-2,5\n").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn file_names_are_sorted() {
        let names = file_names(&sample_zip()).unwrap();
        assert_eq!(
            names,
            [
                "ACME-WMS-Store1-PO-01-2024.csv",
                "BETA SRL-Store A-PO-01-2024.csv"
            ]
        );
    }

    #[test]
    fn read_entries_keeps_contents() {
        let entries = read_entries(&sample_zip()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries["ACME-WMS-Store1-PO-01-2024.csv"],
            b"PO #,Plan Qty\nPO-2,5\n"
        );
    }
}
