//! Cleanup stage: archive processed inputs, purge working prefixes.

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::pipeline::keys;
use crate::storage::{base_name, files, ObjectStore};
use crate::utils;

/// The input objects worth keeping a dated copy of.
const PROCESSED_INPUTS: [&str; 5] = [
    files::BULK_ARCHIVE,
    files::MAIL_BAG,
    files::SCHEDULE,
    files::MAILING_LIST,
    files::RAW_MAPPING,
];

/// Move the processed inputs to `zip-archive/` under timestamped names,
/// then empty `input/` and `wrk/` and drop archive objects past retention.
/// Returns the keys that could not be archived.
pub async fn run(store: &dyn ObjectStore, settings: &Settings) -> Result<Vec<String>> {
    let keys = keys(settings);
    let stamp = utils::business_now().format("%d-%m-%YT%H:%M").to_string();

    let mut failed = Vec::new();
    for name in PROCESSED_INPUTS {
        let from = keys.input(name);
        let to = utils::stamp_key(&keys.archive(name), &stamp);

        if let Err(e) = store.copy(&from, &to).await {
            warn!("could not archive {from}: {e}");
            failed.push(from);
            continue;
        }
        if let Err(e) = store.delete(&from).await {
            warn!("could not delete {from} after archiving: {e}");
            failed.push(from);
        }
    }

    purge(store, &keys.input_prefix(), 0).await?;
    purge(store, &keys.wrk_prefix(), 0).await?;
    purge(store, &keys.archive_prefix(), settings.archive_retention_days).await?;

    info!("cleanup finished, {} files not archived", failed.len());
    Ok(failed)
}

/// Delete every object under a prefix older than `age_days` (zero deletes
/// unconditionally). Folder placeholder keys are left alone.
async fn purge(store: &dyn ObjectStore, prefix: &str, age_days: i64) -> Result<()> {
    let threshold = Utc::now() - Duration::days(age_days);

    for object in store.list(prefix).await? {
        if base_name(&object.key).is_empty() {
            continue;
        }
        let expired = match object.last_modified {
            Some(modified) => modified < threshold,
            // no timestamp: only the unconditional sweep removes it
            None => age_days == 0,
        };
        if expired {
            store.delete(&object.key).await?;
        }
    }
    Ok(())
}
