//! Warehouse portal scraper.
//!
//! Drives a headless Chrome through WebDriver to log into the portal,
//! read minimum-order-quantity (MOV) figures per supplier and store, and
//! request the bulk purchase-order export for all stores and suppliers in
//! the covered cities. The outcome is a pair of artifacts the rest of the
//! pipeline runs on: the MOV table and the zipped per-supplier order files.

pub mod report;
pub mod selectors;
pub mod session;

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::config::{Secrets, Settings};
use crate::error::{AppError, Result};
use crate::models::MovRecord;

/// What a full scrape produces.
pub struct ScrapeOutcome {
    pub mov: Vec<MovRecord>,
    pub bulk_zip: Vec<u8>,
}

/// One portal session, start to finish.
pub struct PortalScraper<'a> {
    settings: &'a Settings,
    secrets: &'a Secrets,
}

impl<'a> PortalScraper<'a> {
    pub fn new(settings: &'a Settings, secrets: &'a Secrets) -> Self {
        Self { settings, secrets }
    }

    /// Run the whole scrape. The browser session is closed on both the
    /// success and the error path.
    pub async fn run(&self) -> Result<ScrapeOutcome> {
        let caps = chrome_capabilities(self.settings);
        let client = ClientBuilder::rustls()
            .map_err(|e| AppError::dependency("webdriver", e))?
            .capabilities(caps)
            .connect(&self.settings.webdriver_url)
            .await
            .map_err(|e| AppError::dependency("webdriver", e))?;
        info!("headless browser session started");

        let outcome = self.drive(&client).await;
        let _ = client.clone().close().await;
        outcome
    }

    async fn drive(&self, client: &Client) -> Result<ScrapeOutcome> {
        session::login(client, self.settings, self.secrets).await?;
        session::open_delivery_orders(client, self.settings).await?;

        let mov = session::collect_mov(client).await?;
        info!("collected {} MOV rows", mov.len());

        let bulk_zip = report::download_bulk_export(client, self.settings).await?;
        info!("bulk export downloaded ({} bytes)", bulk_zip.len());

        Ok(ScrapeOutcome { mov, bulk_zip })
    }
}

/// Chrome capabilities: headless, with unattended downloads into the
/// configured directory.
fn chrome_capabilities(settings: &Settings) -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless=new",
                "--start-maximized",
                "--no-sandbox",
                "--disable-gpu",
                "--ignore-certificate-errors",
                "--disable-dev-shm-usage",
            ],
            "excludeSwitches": ["enable-automation"],
            "prefs": {
                "download.default_directory": settings.download_dir.to_string_lossy(),
                "download.prompt_for_download": false,
                "download.directory_upgrade": true,
                "safebrowsing.enabled": false,
                "profile.default_content_settings": { "images": 2 },
            },
        }),
    );
    caps
}

pub(crate) fn wd(err: fantoccini::error::CmdError) -> AppError {
    AppError::dependency("portal", err)
}

/// Click through JavaScript; some portal menu entries sit under overlay
/// elements that swallow native clicks.
pub(crate) async fn click_via_script(client: &Client, element: &Element) -> Result<()> {
    client
        .execute("arguments[0].click();", vec![serde_json::to_value(element)?])
        .await
        .map_err(wd)?;
    Ok(())
}

pub(crate) async fn is_checked(element: &Element) -> Result<bool> {
    Ok(element.prop("checked").await.map_err(wd)?.as_deref() == Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_carry_download_prefs() {
        let settings = Settings::from_env();
        let caps = chrome_capabilities(&settings);
        let options = &caps["goog:chromeOptions"];
        assert!(options["args"]
            .as_array()
            .unwrap()
            .contains(&json!("--headless=new")));
        assert_eq!(
            options["prefs"]["download.prompt_for_download"],
            json!(false)
        );
    }
}
