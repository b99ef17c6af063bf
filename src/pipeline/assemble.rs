//! Assembler stage: build the day's dispatch table and discrepancy report.

use std::collections::BTreeSet;

use tracing::info;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::{
    group_by_supplier, Discrepancies, DispatchRow, FunctionReply, MailBag, MailingList,
    MovPartition, MovRecord, NameMap, Schedule,
};
use crate::pipeline::{keys, names};
use crate::storage::{files, ObjectStore};
use crate::utils;

/// Assemble today's mail bag.
pub async fn run(store: &dyn ObjectStore, settings: &Settings) -> Result<Discrepancies> {
    run_on_weekday(store, settings, utils::business_weekday()).await
}

/// The assembly itself, parameterized by weekday so tests can pin the day.
///
/// 1. scheduled suppliers for the weekday, 2. mapped through the dictionary,
/// 3. order files grouped by supplier, 4. MOV partition, 5. the dispatch set
/// is scheduled ∩ has-orders minus MOV-blocked, 6. discrepancy lists fall
/// out of the set differences, 7. addresses and the auto-send flag attach
/// from the mailing list, 8. both artifacts persist to `input/`.
pub async fn run_on_weekday(
    store: &dyn ObjectStore,
    settings: &Settings,
    weekday: u32,
) -> Result<Discrepancies> {
    let keys = keys(settings);

    let schedule = Schedule::from_csv(&store.get(&keys.input(files::SCHEDULE)).await?)?;
    let mailing = MailingList::from_csv(&store.get(&keys.input(files::MAILING_LIST)).await?)?;
    let dictionary = NameMap::from_csv(&store.get(&keys.input(files::DICTIONARY)).await?)?;
    let mov = MovRecord::read_csv(&store.get(&keys.input(files::MOV)).await?)?;
    let archive_bytes = store.get(&keys.input(files::BULK_ARCHIVE)).await?;

    let scheduled_rows = schedule.scheduled_on(weekday);
    if scheduled_rows.is_empty() {
        return Err(AppError::business_rule(
            "there are no suppliers scheduled today",
        ));
    }

    // schedule names to warehouse names; misses feed not_in_dict
    let mut scheduled: BTreeSet<String> = BTreeSet::new();
    let mut not_in_dict = Vec::new();
    for row in scheduled_rows {
        match dictionary.lookup(&row.supplier_cad) {
            Some(wms) => {
                scheduled.insert(wms.to_string());
            }
            None => not_in_dict.push(row.supplier_cad.clone()),
        }
    }

    let file_names = utils::archive::file_names(&archive_bytes)?;
    if file_names.is_empty() {
        return Err(AppError::business_rule(
            "there are no orders generated today",
        ));
    }

    // names violating the file convention yield an empty supplier and
    // never match; drop them instead of reporting an empty-string supplier
    let mut groups = group_by_supplier(&file_names);
    groups.remove("");
    let with_orders: BTreeSet<String> = groups.keys().cloned().collect();

    let not_in_cad: Vec<String> = with_orders.difference(&scheduled).cloned().collect();
    let not_in_wms: Vec<String> = scheduled.difference(&with_orders).cloned().collect();

    let partition = MovPartition::from_records(&mov);

    let dispatch: Vec<String> = scheduled
        .intersection(&with_orders)
        .filter(|supplier| !partition.is_blocked(supplier))
        .cloned()
        .collect();

    let no_mov: Vec<String> = dispatch
        .iter()
        .filter(|supplier| !partition.known_suppliers.contains(*supplier))
        .cloned()
        .collect();

    let mut bag = MailBag::default();
    for supplier in &dispatch {
        let entry = mailing.entry(supplier);
        bag.push(DispatchRow {
            supplier: supplier.clone(),
            files: groups[supplier].clone(),
            addresses: entry.map(|e| e.addresses.clone()).unwrap_or_default(),
            is_green: entry.map(|e| e.is_green).unwrap_or(false),
        });
    }

    let report = Discrepancies {
        not_in_cad,
        not_in_wms,
        not_in_mov: partition.not_in_mov.clone(),
        both_mov: partition.both_mov.clone(),
        no_mov,
        not_in_dict,
    };

    store
        .put(&keys.input(files::MAIL_BAG), bag.to_json()?)
        .await?;

    let reply = FunctionReply::success_with_details(names::BAGGER, serde_json::to_value(&report)?);
    store
        .put(&keys.input(files::REPORT), serde_json::to_vec_pretty(&reply)?)
        .await?;

    info!(
        "mail bag assembled: {} dispatch rows, {} without schedule entry, {} without orders",
        bag.len(),
        report.not_in_cad.len(),
        report.not_in_wms.len()
    );
    Ok(report)
}
