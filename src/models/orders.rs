//! Order file naming convention helpers.
//!
//! Warehouse exports are named `SUPPLIER-Store Name-PO-NN-YYYY.csv`. The
//! supplier particle may itself contain one hyphen, which shifts the particle
//! count from five to six.

use std::collections::BTreeMap;

/// Extract the supplier name from an order file name.
///
/// Five particles: the supplier is the first particle (right-trimmed).
/// Six particles: the supplier spans the first two, rejoined with a hyphen.
/// Any other shape violates the convention and yields an empty string.
pub fn extract_supplier(file_name: &str) -> String {
    let particles: Vec<&str> = file_name.split('-').collect();
    match particles.len() {
        5 => particles[0].trim_end().to_string(),
        6 => format!("{}-{}", particles[0], particles[1]),
        _ => String::new(),
    }
}

/// Extract a store name particle from an order file name.
pub fn store_particle(file_name: &str, index: usize) -> Option<&str> {
    file_name.split('-').nth(index)
}

/// Group order file names by their extracted supplier, sorted for
/// deterministic output.
pub fn group_by_supplier(file_names: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in file_names {
        groups
            .entry(extract_supplier(name))
            .or_default()
            .push(name.clone());
    }
    for files in groups.values_mut() {
        files.sort();
    }
    groups
}
