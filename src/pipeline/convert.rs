//! Converter stage: normalize the raw supplier name mapping.

use std::collections::BTreeSet;

use tracing::info;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::pipeline::keys;
use crate::storage::{files, ObjectStore};
use crate::table::Table;

/// Source-sheet column headers.
const RAW_CAD_COLUMN: &str = "Furnizor Cadentar";
const RAW_WMS_COLUMN: &str = "Furnizor WMS";

/// Rewrite the raw mapping sheet into the normalized two-column dictionary
/// the assembler joins on.
pub async fn run(store: &dyn ObjectStore, settings: &Settings) -> Result<()> {
    let keys = keys(settings);
    let bytes = store.get(&keys.input(files::RAW_MAPPING)).await?;

    let mut table = Table::from_bytes(&bytes)?;
    table.rename_column(RAW_CAD_COLUMN, "supplier_cad")?;
    table.rename_column(RAW_WMS_COLUMN, "supplier_wms")?;
    table.select(&["supplier_cad", "supplier_wms"])?;

    let mut seen = BTreeSet::new();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["supplier_cad", "supplier_wms"])?;
    for row in table.rows() {
        let pair = (row[0].trim().to_string(), row[1].trim().to_string());
        if seen.contains(&pair) {
            continue;
        }
        writer.write_record([pair.0.as_str(), pair.1.as_str()])?;
        seen.insert(pair);
    }
    let out = writer
        .into_inner()
        .map_err(|e| AppError::structural("dictionary", e))?;

    store.put(&keys.input(files::DICTIONARY), out).await?;
    info!("supplier dictionary normalized ({} pairs)", seen.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NameMap;
    use crate::storage::LocalStore;

    #[tokio::test]
    async fn converts_headers_and_trims() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let settings = Settings::from_env();
        let keys = crate::pipeline::keys(&settings);

        let raw = "Furnizor Cadentar,Furnizor WMS\n ACME , ACME-WMS \nACME,ACME-WMS\nBETA,BETA SRL\n";
        store
            .put(&keys.input(files::RAW_MAPPING), raw.as_bytes().to_vec())
            .await
            .unwrap();

        run(&store, &settings).await.unwrap();

        let dict = store.get(&keys.input(files::DICTIONARY)).await.unwrap();
        let map = NameMap::from_csv(&dict).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup("ACME"), Some("ACME-WMS"));
        assert_eq!(map.lookup("BETA"), Some("BETA SRL"));
    }

    #[tokio::test]
    async fn missing_source_column_is_structural() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let settings = Settings::from_env();
        let keys = crate::pipeline::keys(&settings);

        store
            .put(
                &keys.input(files::RAW_MAPPING),
                b"Wrong,Headers\na,b\n".to_vec(),
            )
            .await
            .unwrap();

        assert!(run(&store, &settings).await.is_err());
    }
}
