//! Scraper stage: portal session plus artifact upload.

use tracing::info;

use crate::config::{Secrets, Settings};
use crate::error::Result;
use crate::models::MovRecord;
use crate::pipeline::keys;
use crate::scraper::PortalScraper;
use crate::storage::{files, ObjectStore};

/// Scrape the portal and publish `mov_data.csv` and the bulk order archive
/// under `input/`.
pub async fn run(store: &dyn ObjectStore, settings: &Settings, secrets: &Secrets) -> Result<()> {
    let outcome = PortalScraper::new(settings, secrets).run().await?;

    let keys = keys(settings);
    store
        .put(
            &keys.input(files::MOV),
            MovRecord::write_csv(&outcome.mov)?,
        )
        .await?;
    store
        .put(&keys.input(files::BULK_ARCHIVE), outcome.bulk_zip)
        .await?;

    info!("scrape artifacts uploaded");
    Ok(())
}
