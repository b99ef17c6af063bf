//! First mutator pass: supplier-specific order file transforms.
//!
//! A handful of suppliers cannot take the warehouse export as-is. Their
//! order files are rewritten (extra columns, column renames, pack-size
//! conversion) and in some cases renamed to the spelling their own intake
//! systems expect. Everything else passes through untouched. The pass ends
//! by publishing every dispatched order file under `wrk/` and saving the
//! updated mail bag.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::{store_particle, MailBag};
use crate::pipeline::keys;
use crate::storage::{files, ObjectStore};
use crate::table::Table;
use crate::utils;

const STAR_FOODS: &str = "STAR FOODS E.M. SRL";
const COCA_COLA: &str = "COCA COLA HBC ROMANIA SRL";
const STOCKDAY: &str = "STOCKDAY SRL";
const QUADRANT: &str = "QUADRANT-AMROQ BEVERAGES SRL";

/// Store catalogs. The fourth store appears in the wild with two Unicode
/// spellings (precomposed and combining breve), both must resolve.
const DANONE_STORE_IDS: [(&str, &str); 5] = [
    ("Bolt Market Vitan", "250217543"),
    ("Bolt Market Central", "250217544"),
    ("Bolt Market Apaca", "250217541"),
    ("Bolt Market Bun\u{103} Ziua", "250217542"),
    ("Bolt Market Buna\u{306} Ziua", "250217542"),
];

const RETAIL_STORE_IDS: [(&str, &str); 5] = [
    ("Bolt Market Vitan", "200751576"),
    ("Bolt Market Central", "200764451"),
    ("Bolt Market Apaca", "200751579"),
    ("Bolt Market Bun\u{103} Ziua", "200770772"),
    ("Bolt Market Buna\u{306} Ziua", "200770772"),
];

const AUCHAN_STORE_TAGS: [(&str, &str); 5] = [
    ("Bolt Market Vitan", "Bolt 03"),
    ("Bolt Market Central", "Bolt 05"),
    ("Bolt Market Apaca", "Bolt 04"),
    ("Bolt Market Bun\u{103} Ziua", "Bolt 01"),
    ("Bolt Market Buna\u{306} Ziua", "Bolt 01"),
];

/// Apply every supplier-specific transform and publish the work files.
pub async fn run(store: &dyn ObjectStore, settings: &Settings) -> Result<()> {
    let keys = keys(settings);

    let mut bag = MailBag::from_json(&store.get(&keys.input(files::MAIL_BAG)).await?)?;
    let mut orders = utils::archive::read_entries(&store.get(&keys.input(files::BULK_ARCHIVE)).await?)?;
    let pack_sizes = match store.get_optional(&keys.input(files::PACK_SIZES)).await? {
        Some(bytes) => Some(PackSizes::from_csv(&bytes)?),
        None => None,
    };
    let now = utils::business_now();

    let suppliers: Vec<String> = bag.rows.iter().map(|r| r.supplier.clone()).collect();
    for supplier in suppliers {
        let file_list = bag
            .row(&supplier)
            .map(|row| row.files.clone())
            .unwrap_or_default();

        if first_word(&supplier) == "DANONE" {
            for name in &file_list {
                add_store_id_column(&mut orders, name)?;
            }
            debug!("store-id column added for {supplier}");
        } else if supplier == STAR_FOODS {
            for name in &file_list {
                let new_name = retail_file_name(name, 1, "Star Foods")?;
                rename_order(&mut orders, name, &new_name)?;
                bag.rename_file(&supplier, name, &new_name);
            }
            debug!("files renamed for {supplier}");
        } else if first_word(&supplier) == "AUCHAN" {
            for name in &file_list {
                let new_name = rewrite_for_auchan(&mut orders, name, &now)?;
                rename_order(&mut orders, name, &new_name)?;
                bag.rename_file(&supplier, name, &new_name);
            }
            debug!("content rewritten and files renamed for {supplier}");
        } else if supplier == QUADRANT {
            for name in &file_list {
                let sizes = require_pack_sizes(pack_sizes.as_ref())?;
                let mut table = load_order(&orders, name)?;
                apply_pack_sizes(&mut table, sizes)?;
                table.drop_columns(&["No."])?;
                orders.insert(name.clone(), table.to_bytes()?);

                let new_name = retail_file_name(name, 2, "Quadrant")?;
                rename_order(&mut orders, name, &new_name)?;
                bag.rename_file(&supplier, name, &new_name);
            }
            debug!("pack sizes applied and files renamed for {supplier}");
        } else if supplier == COCA_COLA || supplier == STOCKDAY {
            for name in &file_list {
                let sizes = require_pack_sizes(pack_sizes.as_ref())?;
                let mut table = load_order(&orders, name)?;
                apply_pack_sizes(&mut table, sizes)?;
                orders.insert(name.clone(), table.to_bytes()?);
            }
            debug!("pack sizes applied for {supplier}");
        }
    }

    // publish the work files the mailer will attach
    let mut published = 0usize;
    for row in &bag.rows {
        for name in &row.files {
            let bytes = orders.get(name).ok_or_else(|| {
                AppError::structural("orders", format!("order file missing from archive: {name}"))
            })?;
            store.put(&keys.wrk(name), bytes.clone()).await?;
            published += 1;
        }
    }

    store
        .put(&keys.input(files::MAIL_BAG), bag.to_json()?)
        .await?;

    info!("first mutator pass done, {published} order files published");
    Ok(())
}

fn first_word(supplier: &str) -> &str {
    supplier.split_whitespace().next().unwrap_or_default()
}

fn store_lookup<'c>(catalog: &[(&'c str, &'c str)], store: &str, context: &str) -> Result<&'c str> {
    catalog
        .iter()
        .find(|(name, _)| *name == store)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            AppError::business_rule(format!("store name {store:?} untreated ({context})"))
        })
}

fn load_order(orders: &BTreeMap<String, Vec<u8>>, name: &str) -> Result<Table> {
    let bytes = orders
        .get(name)
        .ok_or_else(|| AppError::structural("orders", format!("could not find {name}")))?;
    Table::from_bytes(bytes)
}

fn rename_order(orders: &mut BTreeMap<String, Vec<u8>>, old: &str, new: &str) -> Result<()> {
    let bytes = orders
        .remove(old)
        .ok_or_else(|| AppError::structural("orders", format!("could not find {old}")))?;
    orders.insert(new.to_string(), bytes);
    Ok(())
}

fn name_store<'a>(name: &'a str, particle: usize, context: &str) -> Result<&'a str> {
    store_particle(name, particle).ok_or_else(|| {
        AppError::structural("orders", format!("errors in parsing the file name ({context})"))
    })
}

/// The `PO-NN-YYYY` tail of an order file name, extension stripped.
fn po_number(name: &str) -> Result<String> {
    let particles: Vec<&str> = name.split('-').collect();
    if particles.len() < 3 {
        return Err(AppError::structural(
            "orders",
            format!("file name too short for an order number: {name}"),
        ));
    }
    let last = particles[particles.len() - 1]
        .split('.')
        .next()
        .unwrap_or_default();
    Ok(format!(
        "{}-{}-{}",
        particles[particles.len() - 3],
        particles[particles.len() - 2],
        last
    ))
}

/// Danone: the intake wants the numeric store id as an extra column.
fn add_store_id_column(orders: &mut BTreeMap<String, Vec<u8>>, name: &str) -> Result<()> {
    let store = name_store(name, 1, "Danone")?;
    let store_id = store_lookup(&DANONE_STORE_IDS, store, "Danone")?;

    let mut table = load_order(orders, name)?;
    table.add_column("Cod magazin", store_id);
    orders.insert(name.to_string(), table.to_bytes()?);
    Ok(())
}

/// `Comanda <po> <label> <store-id>.csv`, the retail intake spelling used
/// by Star Foods (store particle 1) and Quadrant (store particle 2).
fn retail_file_name(name: &str, store_index: usize, label: &str) -> Result<String> {
    let store = name_store(name, store_index, label)?;
    let store_id = store_lookup(&RETAIL_STORE_IDS, store, label)?;
    let po = po_number(name)?;
    Ok(format!("Comanda {po} {label} {store_id}.csv"))
}

/// Auchan: full column rewrite into their order-intake layout, plus the
/// `BoltNN_comenzi_<date>_<time>.csv` name their import job expects.
fn rewrite_for_auchan(
    orders: &mut BTreeMap<String, Vec<u8>>,
    name: &str,
    now: &DateTime<Tz>,
) -> Result<String> {
    let store = name_store(name, 1, "Auchan")?;
    let tag = store_lookup(&AUCHAN_STORE_TAGS, store, "Auchan")?;

    let mut table = load_order(orders, name)?;
    table.rename_column("PO #", "Cod comanda (intern client)")?;
    table.rename_column("Plan Qty", "Cantitate")?;
    table.rename_column("Supplier SKU", "Cod Produs")?;
    table.rename_column("Req. delivery time", "Timestamp")?;
    table.drop_columns(&[
        "No.",
        "Product Name",
        "EAN",
        "Supplier Name",
        "Store Name",
        "Provider Id",
        "Bolt SKU",
        "Unit",
    ])?;

    let date = now.format("%d.%m.%Y").to_string();
    table.add_column("Cod Client", tag);
    table.add_column("Data plasare comenzi", &date);
    table.add_column("Denumire Produs", "");
    table.add_column("Unitate Masura", "");
    table.add_column("Pret Unitar", "");
    table.add_column("Pret", "");
    table.add_column("Total Comanda", "");
    table.map_column("Timestamp", |_| Ok(format!("{date} 10:30")))?;

    table.map_column("Cod Produs", |value| {
        let code: u64 = value.trim().parse().map_err(|_| {
            AppError::structural("orders", format!("product code conversion error: {value:?}"))
        })?;
        Ok(format!("{code:06}"))
    })?;

    table.select(&[
        "Cod Client",
        "Data plasare comenzi",
        "Cod comanda (intern client)",
        "Cod Produs",
        "Denumire Produs",
        "Cantitate",
        "Unitate Masura",
        "Pret Unitar",
        "Pret",
        "Total Comanda",
        "Timestamp",
    ])?;
    orders.insert(name.to_string(), table.to_bytes()?);

    Ok(format!(
        "{}_comenzi_{}_{}.csv",
        tag.replace(' ', ""),
        now.format("%Y%m%d"),
        now.format("%H%M%S"),
    ))
}

fn require_pack_sizes(pack_sizes: Option<&PackSizes>) -> Result<&PackSizes> {
    pack_sizes.ok_or_else(|| AppError::dependency("pack sizes", "pack size sheet not available"))
}

/// Pack sizes by SKU, for suppliers ordering in boxes rather than units.
pub struct PackSizes {
    sizes: BTreeMap<String, f64>,
}

impl PackSizes {
    /// Parse the pack-size sheet; headers are the partner's spellings.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let table = Table::from_bytes(bytes)?;
        let sku = table
            .column_index("SKU")
            .ok_or_else(|| AppError::structural("pack sizes", "missing column: SKU"))?;
        let bulk = table.column_index("Bulk quantity, units").ok_or_else(|| {
            AppError::structural("pack sizes", "missing column: Bulk quantity, units")
        })?;

        let mut sizes = BTreeMap::new();
        for row in table.rows() {
            if let Ok(size) = row[bulk].trim().parse::<f64>() {
                sizes.insert(row[sku].trim().to_string(), size);
            }
        }
        Ok(Self { sizes })
    }

    pub fn get(&self, sku: &str) -> Option<f64> {
        self.sizes.get(sku.trim()).copied()
    }
}

/// Rewrite `Plan Qty` from units into boxes. SKUs without a pack size keep
/// their unit quantity.
fn apply_pack_sizes(table: &mut Table, sizes: &PackSizes) -> Result<()> {
    let sku = table
        .column_index("Bolt SKU")
        .ok_or_else(|| AppError::structural("orders", "missing column: Bolt SKU"))?;
    let qty = table
        .column_index("Plan Qty")
        .ok_or_else(|| AppError::structural("orders", "missing column: Plan Qty"))?;

    for row in table.rows_mut() {
        let Some(size) = sizes.get(&row[sku]).filter(|s| *s > 0.0) else {
            continue;
        };
        let Ok(quantity) = row[qty].trim().parse::<f64>() else {
            continue;
        };
        row[qty] = format!("{}", (quantity / size).round() as i64);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DispatchRow;
    use crate::storage::LocalStore;
    use chrono::TimeZone;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    const ORDER_CSV: &str = "\
No.,PO #,Product Name,EAN,Supplier Name,Store Name,Provider Id,Bolt SKU,Unit,Plan Qty,Supplier SKU,Req. delivery time
1,PO-77,Apa 2L,5941234,ACME,Bolt Market Vitan,9,SKU-1,buc,24,731,2024-03-12
2,PO-77,Suc 1L,5949999,ACME,Bolt Market Vitan,9,SKU-2,buc,7,88,2024-03-12
";

    fn pack_csv() -> &'static str {
        // header cell contains a comma, so quote it
        "SKU,Product,\"Bulk quantity, units\"\nSKU-1,Apa 2L,6\n"
    }

    #[test]
    fn danone_gets_a_store_id_column() {
        let mut orders = BTreeMap::new();
        let name = "DANONE SRL-Bolt Market Vitan-PO-03-2024.csv";
        orders.insert(name.to_string(), ORDER_CSV.as_bytes().to_vec());

        add_store_id_column(&mut orders, name).unwrap();

        let table = Table::from_bytes(&orders[name]).unwrap();
        assert_eq!(table.get(0, "Cod magazin"), Some("250217543"));
        assert_eq!(table.get(1, "Cod magazin"), Some("250217543"));
    }

    #[test]
    fn unknown_store_aborts() {
        let mut orders = BTreeMap::new();
        let name = "DANONE SRL-Mystery Store-PO-03-2024.csv";
        orders.insert(name.to_string(), ORDER_CSV.as_bytes().to_vec());

        let err = add_store_id_column(&mut orders, name).unwrap_err();
        assert!(err.to_string().contains("Mystery Store"));
    }

    #[test]
    fn both_unicode_spellings_resolve() {
        for store in ["Bolt Market Bun\u{103} Ziua", "Bolt Market Buna\u{306} Ziua"] {
            assert_eq!(
                store_lookup(&RETAIL_STORE_IDS, store, "test").unwrap(),
                "200770772"
            );
        }
    }

    #[test]
    fn star_foods_file_name() {
        let name = "STAR FOODS E.M. SRL-Bolt Market Central-PO-12-2024.csv";
        assert_eq!(
            retail_file_name(name, 1, "Star Foods").unwrap(),
            "Comanda PO-12-2024 Star Foods 200764451.csv"
        );
    }

    #[test]
    fn quadrant_uses_the_third_particle() {
        let name = "QUADRANT-AMROQ BEVERAGES SRL-Bolt Market Apaca-PO-09-2024.csv";
        assert_eq!(
            retail_file_name(name, 2, "Quadrant").unwrap(),
            "Comanda PO-09-2024 Quadrant 200751579.csv"
        );
    }

    #[test]
    fn auchan_rewrite_reorders_and_pads() {
        let mut orders = BTreeMap::new();
        let name = "AUCHAN ROMANIA SA-Bolt Market Vitan-PO-05-2024.csv";
        orders.insert(name.to_string(), ORDER_CSV.as_bytes().to_vec());
        let now = chrono::Utc
            .with_ymd_and_hms(2024, 3, 12, 10, 0, 0)
            .unwrap()
            .with_timezone(&chrono_tz::Europe::Bucharest);

        let new_name = rewrite_for_auchan(&mut orders, name, &now).unwrap();
        assert_eq!(new_name, "Bolt03_comenzi_20240312_120000.csv");

        let table = Table::from_bytes(&orders[name]).unwrap();
        assert_eq!(
            table.headers()[..4],
            [
                "Cod Client".to_string(),
                "Data plasare comenzi".to_string(),
                "Cod comanda (intern client)".to_string(),
                "Cod Produs".to_string(),
            ]
        );
        assert_eq!(table.get(0, "Cod Client"), Some("Bolt 03"));
        assert_eq!(table.get(0, "Cod Produs"), Some("000731"));
        assert_eq!(table.get(0, "Cantitate"), Some("24"));
        assert_eq!(table.get(0, "Timestamp"), Some("12.03.2024 10:30"));
    }

    #[test]
    fn pack_sizes_round_units_to_boxes() {
        let sizes = PackSizes::from_csv(pack_csv().as_bytes()).unwrap();
        let mut table = Table::from_bytes(ORDER_CSV.as_bytes()).unwrap();

        apply_pack_sizes(&mut table, &sizes).unwrap();

        // 24 units at 6 per box
        assert_eq!(table.get(0, "Plan Qty"), Some("4"));
        // SKU-2 has no pack size, unchanged
        assert_eq!(table.get(1, "Plan Qty"), Some("7"));
    }

    #[tokio::test]
    async fn run_publishes_work_files_and_updates_the_bag() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let settings = Settings::from_env();
        let keys = crate::pipeline::keys(&settings);

        let plain = "PLAIN SRL-Bolt Market Vitan-PO-01-2024.csv";
        let star = "STAR FOODS E.M. SRL-Bolt Market Vitan-PO-02-2024.csv";

        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for name in [plain, star] {
            writer.start_file(name, options).unwrap();
            writer.write_all(ORDER_CSV.as_bytes()).unwrap();
        }
        let archive = writer.finish().unwrap().into_inner();

        let bag = MailBag {
            rows: vec![
                DispatchRow {
                    supplier: "PLAIN SRL".to_string(),
                    files: vec![plain.to_string()],
                    addresses: vec!["plain@example.ro".to_string()],
                    is_green: true,
                },
                DispatchRow {
                    supplier: STAR_FOODS.to_string(),
                    files: vec![star.to_string()],
                    addresses: vec!["star@example.ro".to_string()],
                    is_green: true,
                },
            ],
        };

        store
            .put(&keys.input(files::BULK_ARCHIVE), archive)
            .await
            .unwrap();
        store
            .put(&keys.input(files::MAIL_BAG), bag.to_json().unwrap())
            .await
            .unwrap();

        run(&store, &settings).await.unwrap();

        let bag =
            MailBag::from_json(&store.get(&keys.input(files::MAIL_BAG)).await.unwrap()).unwrap();
        let renamed = "Comanda PO-02-2024 Star Foods 200751576.csv";
        assert_eq!(bag.row(STAR_FOODS).unwrap().files, [renamed]);

        // both the untouched and the renamed file are published
        assert!(store.get_optional(&keys.wrk(plain)).await.unwrap().is_some());
        assert!(store
            .get_optional(&keys.wrk(renamed))
            .await
            .unwrap()
            .is_some());
    }
}
