//! Mailer stage: send order files to suppliers, then the run summary.

use serde_json::Value;
use tracing::{info, warn};

use crate::config::{Secrets, Settings};
use crate::error::{AppError, Result};
use crate::mailer::{
    self, MailAttachment, MailContext, Mailer, PER_ATTACHMENT_SUPPLIER,
};
use crate::models::{Discrepancies, MailBag};
use crate::pipeline::keys;
use crate::storage::{files, ObjectStore};
use crate::utils;

/// Send every green dispatch row its order files, collect per-supplier
/// failures, and finish with the operator summary. Supplier failures never
/// block the run; a summary failure does.
pub async fn run(
    store: &dyn ObjectStore,
    settings: &Settings,
    secrets: &Secrets,
    context: MailContext,
) -> Result<()> {
    let keys = keys(settings);

    let bag = MailBag::from_json(&store.get(&keys.input(files::MAIL_BAG)).await?)?;
    let report = load_report(&store.get(&keys.input(files::REPORT)).await?)?;
    let mailer = Mailer::new(settings, secrets)?;
    let subject = mailer::subject_today();

    let mut sent: Vec<(String, String)> = Vec::new();
    let mut no_addresses: Vec<String> = Vec::new();
    let mut failed: Vec<String> = Vec::new();

    for row in &bag.rows {
        if row.addresses.is_empty() {
            info!("no recipients for {}, skipped", row.supplier);
            no_addresses.push(row.supplier.clone());
            continue;
        }
        if !row.is_green {
            info!("{} is not enabled for auto-send, skipped", row.supplier);
            continue;
        }

        let mut attachments = Vec::with_capacity(row.files.len());
        for name in &row.files {
            attachments.push(MailAttachment {
                file_name: name.clone(),
                bytes: store.get(&keys.wrk(name)).await?,
            });
        }

        let recipients = context.supplier_recipients(&row.addresses);
        if row.supplier == PER_ATTACHMENT_SUPPLIER {
            for attachment in attachments {
                let file_name = attachment.file_name.clone();
                match mailer
                    .send(&recipients, &subject, mailer::supplier_body(), &[attachment])
                    .await
                {
                    Ok(()) => sent.push((
                        row.supplier.clone(),
                        mailer::store_from_file(&file_name, &row.supplier),
                    )),
                    Err(e) => {
                        warn!("mail to {} failed: {e}", row.supplier);
                        failed.push(row.supplier.clone());
                    }
                }
            }
        } else {
            match mailer
                .send(&recipients, &subject, mailer::supplier_body(), &attachments)
                .await
            {
                Ok(()) => {
                    for name in &row.files {
                        sent.push((
                            row.supplier.clone(),
                            mailer::store_from_file(name, &row.supplier),
                        ));
                    }
                }
                Err(e) => {
                    warn!("mail to {} failed: {e}", row.supplier);
                    failed.push(row.supplier.clone());
                }
            }
        }
    }

    // the summary always goes out; its failure is the stage's failure
    let summary_attachments = if sent.is_empty() {
        Vec::new()
    } else {
        vec![MailAttachment {
            file_name: format!(
                "SummaryPO_{}.csv",
                utils::business_now().format("%d-%m-%Y")
            ),
            bytes: mailer::summary_csv(&sent)?,
        }]
    };
    let body = mailer::summary_body(&report, &no_addresses, &failed);
    mailer
        .send(
            &context.summary_recipients(),
            &subject,
            &body,
            &summary_attachments,
        )
        .await?;

    info!(
        "mailing finished: {} sends, {} failures, {} without addresses",
        sent.len(),
        failed.len(),
        no_addresses.len()
    );
    Ok(())
}

/// The report artifact is the assembler's reply; the lists live under
/// `error_details`.
fn load_report(bytes: &[u8]) -> Result<Discrepancies> {
    let value: Value = serde_json::from_slice(bytes)?;
    let details = value
        .get("error_details")
        .cloned()
        .ok_or_else(|| AppError::structural("report", "missing error_details"))?;
    serde_json::from_value(details)
        .map_err(|e| AppError::structural("report", format!("bad discrepancy shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_parses_from_the_assembler_reply() {
        let raw = r#"{
            "function_name": "MailBagger",
            "error_message": null,
            "error_details": {
                "not-in-cad": ["ORPHAN SRL"],
                "not-in-wms": [],
                "not-in-mov": ["BETA SRL"],
                "both-mov": [],
                "no-mov": [],
                "not-in-dict": []
            }
        }"#;
        let report = load_report(raw.as_bytes()).unwrap();
        assert_eq!(report.not_in_cad, ["ORPHAN SRL"]);
        assert_eq!(report.not_in_mov, ["BETA SRL"]);
    }

    #[test]
    fn report_without_details_is_structural() {
        assert!(load_report(br#"{ "function_name": "MailBagger" }"#).is_err());
    }
}
