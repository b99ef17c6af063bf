//! Pipeline stages and their dispatch.
//!
//! Each submodule is one stage of the daily run. Stages share nothing but
//! object storage; an external scheduler invokes them in order:
//! scrape → convert → assemble → mutate_one → mutate_two → mail → cleanup.

pub mod assemble;
pub mod check;
pub mod cleanup;
pub mod convert;
pub mod mail;
pub mod mutate_one;
pub mod mutate_two;
pub mod scrape;

use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::config::{SecretsLoader, Settings};
use crate::models::FunctionReply;
use crate::storage::{Keys, ObjectStore};

pub use mutate_two::RegionSplitRule;

/// Stage names as reported in [`FunctionReply`].
pub mod names {
    pub const SCRAPER: &str = "Scraper";
    pub const CONVERTER: &str = "Converter";
    pub const BAGGER: &str = "MailBagger";
    pub const MUTATE_ONE: &str = "SuppMod-One";
    pub const MUTATE_TWO: &str = "SuppMod-Two";
    pub const MAILER: &str = "Mailer";
    pub const CLEANER: &str = "Cleaner";
    pub const CHECK: &str = "CheckHealth";
}

/// One invocation request: which stage to run and its parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    pub function: String,

    /// Required by the mailer stage
    #[serde(default)]
    pub mailing_context: Option<String>,

    /// Region split rules for the second mutator pass
    #[serde(default)]
    pub region_splits: Vec<RegionSplitRule>,
}

pub(crate) fn keys(settings: &Settings) -> Keys {
    Keys::new(settings.prefix.clone())
}

/// Run the requested stage and fold its outcome into a reply. Stages that
/// need credentials fetch them here, once per invocation.
pub async fn dispatch(
    store: &dyn ObjectStore,
    settings: &Settings,
    invocation: &Invocation,
) -> FunctionReply {
    let function = invocation.function.as_str();

    let result = match function {
        names::SCRAPER => {
            match load_secrets(settings).await {
                Ok(secrets) => scrape::run(store, settings, &secrets).await,
                Err(e) => Err(e),
            }
        }
        names::CONVERTER => convert::run(store, settings).await,
        names::BAGGER => assemble::run(store, settings).await.map(|_| ()),
        names::MUTATE_ONE => mutate_one::run(store, settings).await,
        names::MUTATE_TWO => mutate_two::run(store, settings, &invocation.region_splits).await,
        names::MAILER => {
            let context = invocation
                .mailing_context
                .as_deref()
                .unwrap_or_default()
                .parse();
            match (context, load_secrets(settings).await) {
                (Ok(context), Ok(secrets)) => {
                    mail::run(store, settings, &secrets, context).await
                }
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }
        names::CLEANER => {
            return match cleanup::run(store, settings).await {
                Ok(failed) if failed.is_empty() => FunctionReply::success(names::CLEANER),
                Ok(failed) => FunctionReply::failure_with_details(
                    names::CLEANER,
                    "some files have not been processed",
                    json!(failed),
                ),
                Err(e) => {
                    error!("{} failed: {e}", names::CLEANER);
                    FunctionReply::failure(names::CLEANER, e)
                }
            };
        }
        names::CHECK => {
            return match check::run(settings).await {
                Ok(body) => FunctionReply::success_with_details(names::CHECK, body),
                Err(e) => {
                    error!("{} failed: {e}", names::CHECK);
                    FunctionReply::failure(names::CHECK, e)
                }
            };
        }
        other => {
            return FunctionReply::failure(other, format!("unknown function: {other}"));
        }
    };

    match result {
        Ok(()) => FunctionReply::success(function),
        Err(e) => {
            error!("{function} failed: {e}");
            FunctionReply::failure(function, e)
        }
    }
}

async fn load_secrets(settings: &Settings) -> crate::error::Result<crate::config::Secrets> {
    SecretsLoader::from_env().await.load(&settings.secret_id).await
}
