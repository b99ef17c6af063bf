//! Second mutator pass: region-split mailing rules.
//!
//! Some suppliers deliver Bucharest and Cluj from different depots and want
//! separate order mails per region. Each configured rule replaces the
//! supplier's single dispatch row with two rows, files partitioned by the
//! store particle of their names, each with its own recipient list.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::{store_particle, DispatchRow, MailBag};
use crate::pipeline::keys;
use crate::storage::{files, ObjectStore};

/// One supplier's region split, supplied in the invocation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSplitRule {
    /// Warehouse-system supplier name
    pub supplier: String,

    /// Which hyphen particle of the file name carries the store (suppliers
    /// with a hyphen in their own name shift it by one)
    pub store_particle: usize,

    /// Stores delivered from the region-B depot
    pub region_b_stores: Vec<String>,

    pub region_a_addresses: Vec<String>,
    pub region_b_addresses: Vec<String>,
}

/// Replace the supplier's dispatch row with one row per region. A rule for
/// a supplier without a dispatch row aborts the run.
pub fn apply_rule(bag: &mut MailBag, rule: &RegionSplitRule) -> Result<()> {
    let row = bag.remove(&rule.supplier).ok_or_else(|| {
        AppError::business_rule(format!("no dispatch row for {}", rule.supplier))
    })?;

    let mut region_a = Vec::new();
    let mut region_b = Vec::new();
    for file in row.files {
        let store = store_particle(&file, rule.store_particle).unwrap_or_default();
        if rule.region_b_stores.iter().any(|s| s == store) {
            region_b.push(file);
        } else {
            region_a.push(file);
        }
    }

    bag.push(DispatchRow {
        supplier: rule.supplier.clone(),
        files: region_a,
        addresses: rule.region_a_addresses.clone(),
        is_green: row.is_green,
    });
    bag.push(DispatchRow {
        supplier: rule.supplier.clone(),
        files: region_b,
        addresses: rule.region_b_addresses.clone(),
        is_green: row.is_green,
    });
    Ok(())
}

/// Apply every region split rule to the stored mail bag.
pub async fn run(
    store: &dyn ObjectStore,
    settings: &Settings,
    rules: &[RegionSplitRule],
) -> Result<()> {
    let keys = keys(settings);
    let mut bag = MailBag::from_json(&store.get(&keys.input(files::MAIL_BAG)).await?)?;

    for rule in rules {
        apply_rule(&mut bag, rule)?;
        info!("region split applied for {}", rule.supplier);
    }

    store
        .put(&keys.input(files::MAIL_BAG), bag.to_json()?)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> RegionSplitRule {
        RegionSplitRule {
            supplier: "J.T. INTERNATIONAL SRL".to_string(),
            store_particle: 1,
            region_b_stores: vec!["Tobacco Store Cluj".to_string()],
            region_a_addresses: vec!["buc@jti.ro".to_string()],
            region_b_addresses: vec!["clj@jti.ro".to_string()],
        }
    }

    fn bag() -> MailBag {
        MailBag {
            rows: vec![DispatchRow {
                supplier: "J.T. INTERNATIONAL SRL".to_string(),
                files: vec![
                    "J.T. INTERNATIONAL SRL-Bolt Market Vitan-PO-01-2024.csv".to_string(),
                    "J.T. INTERNATIONAL SRL-Tobacco Store Cluj-PO-02-2024.csv".to_string(),
                ],
                addresses: vec!["orders@jti.ro".to_string()],
                is_green: false,
            }],
        }
    }

    #[test]
    fn split_partitions_files_and_preserves_is_green() {
        let mut bag = bag();
        apply_rule(&mut bag, &rule()).unwrap();

        assert_eq!(bag.len(), 2);
        let region_a = &bag.rows[0];
        let region_b = &bag.rows[1];

        assert_eq!(
            region_a.files,
            ["J.T. INTERNATIONAL SRL-Bolt Market Vitan-PO-01-2024.csv"]
        );
        assert_eq!(region_a.addresses, ["buc@jti.ro"]);
        assert_eq!(
            region_b.files,
            ["J.T. INTERNATIONAL SRL-Tobacco Store Cluj-PO-02-2024.csv"]
        );
        assert_eq!(region_b.addresses, ["clj@jti.ro"]);

        // union of the two partitions is the original file set
        assert!(!region_a.is_green);
        assert!(!region_b.is_green);
    }

    #[test]
    fn hyphenated_supplier_uses_a_shifted_particle() {
        let mut bag = MailBag {
            rows: vec![DispatchRow {
                supplier: "CRIS-TIM COMPANIE DE FAMILIE SRL".to_string(),
                files: vec![
                    "CRIS-TIM COMPANIE DE FAMILIE SRL-Ice Cream Store-PO-05-2024.csv".to_string(),
                ],
                addresses: vec![],
                is_green: true,
            }],
        };
        let rule = RegionSplitRule {
            supplier: "CRIS-TIM COMPANIE DE FAMILIE SRL".to_string(),
            store_particle: 2,
            region_b_stores: vec!["Ice Cream Store".to_string()],
            region_a_addresses: vec!["buc@cristim.ro".to_string()],
            region_b_addresses: vec!["clj@cristim.ro".to_string()],
        };

        apply_rule(&mut bag, &rule).unwrap();
        assert!(bag.rows[0].files.is_empty());
        assert_eq!(bag.rows[1].files.len(), 1);
    }

    #[test]
    fn missing_supplier_aborts() {
        let mut empty = MailBag::default();
        let err = apply_rule(&mut empty, &rule()).unwrap_err();
        assert!(err.to_string().contains("J.T. INTERNATIONAL SRL"));
    }
}
