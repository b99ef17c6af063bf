//! The bulk export dialog: field selection, scoping and download.

use std::collections::BTreeSet;
use std::fs;
use std::time::Duration;

use fantoccini::actions::{InputSource, MouseActions, PointerAction, MOUSE_BUTTON_LEFT};
use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::scraper::{click_via_script, is_checked, selectors, wd};
use crate::utils;

/// Request a bulk purchase-order export covering every store and supplier
/// in the covered cities, then wait for the zip to land in the download
/// directory. Returns the archive bytes.
pub async fn download_bulk_export(client: &Client, settings: &Settings) -> Result<Vec<u8>> {
    client
        .find(Locator::XPath(selectors::REPORT_BUTTON))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;
    sleep(Duration::from_secs(1)).await;

    let dialog = client
        .find(Locator::XPath(selectors::REPORT_DIALOG))
        .await
        .map_err(|_| AppError::structural("portal", "report dialog did not open"))?;
    sleep(Duration::from_secs(1)).await;
    info!("report dialog open");

    select_bulk_export(&dialog).await?;
    select_csv_format(client, &dialog).await?;
    select_report_fields(client).await?;
    select_cities(client, &dialog).await?;
    select_all_stores(client, &dialog).await?;
    select_all_suppliers(client, &dialog).await?;
    verify_report_date(&dialog).await?;

    // zipped download, one archive instead of per-supplier files
    dialog
        .find(Locator::XPath(selectors::ZIP_CHECKBOX))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;

    dialog
        .find(Locator::XPath(selectors::GENERATE_BUTTON))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;

    let path = settings.download_dir.join(selectors::DOWNLOAD_FILE_NAME);
    let mut downloaded = false;
    for _ in 0..settings.download_attempts {
        if path.exists() {
            downloaded = true;
            break;
        }
        sleep(settings.download_poll).await;
    }
    if !downloaded {
        return Err(AppError::dependency(
            "portal",
            "bulk export download timed out",
        ));
    }

    // dismiss the dialog; failure here does not void the download
    if let Ok(cancel) = dialog.find(Locator::XPath(selectors::CANCEL_BUTTON)).await {
        let _ = cancel.click().await;
    }

    Ok(fs::read(&path)?)
}

async fn select_bulk_export(dialog: &Element) -> Result<()> {
    let radios = dialog
        .find_all(Locator::XPath(selectors::RADIO_INPUTS))
        .await
        .map_err(wd)?;
    for radio in radios {
        if radio.attr("value").await.map_err(wd)?.as_deref()
            == Some(selectors::BULK_EXPORT_RADIO_VALUE)
        {
            radio.click().await.map_err(wd)?;
            return Ok(());
        }
    }
    Err(AppError::structural(
        "portal",
        "bulk export option not present in the report dialog",
    ))
}

async fn select_csv_format(client: &Client, dialog: &Element) -> Result<()> {
    dialog
        .find(Locator::XPath(selectors::FORMAT_DROPDOWN))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;
    sleep(Duration::from_secs(1)).await;

    client
        .find(Locator::XPath(selectors::FORMAT_CSV_OPTION))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;
    sleep(Duration::from_secs(1)).await;
    Ok(())
}

/// Bring every export field checkbox to its wanted state, master
/// "Select all" first so it cannot flip the rest afterwards.
async fn select_report_fields(client: &Client) -> Result<()> {
    let checkboxes = client
        .find_all(Locator::XPath(selectors::CHECKBOX_INPUTS))
        .await
        .map_err(wd)?;

    for checkbox in checkboxes {
        let Some(name) = checkbox.attr("name").await.map_err(wd)? else {
            continue;
        };
        let checked = is_checked(&checkbox).await?;

        if name == selectors::SELECT_ALL_FIELD {
            if checked {
                checkbox.click().await.map_err(wd)?;
            }
            continue;
        }
        if let Some((_, wanted)) = selectors::REPORT_FIELDS.iter().find(|(n, _)| *n == name) {
            if checked != *wanted {
                checkbox.click().await.map_err(wd)?;
            }
        }
    }
    debug!("export fields set");
    Ok(())
}

async fn select_cities(client: &Client, dialog: &Element) -> Result<()> {
    dialog
        .find(Locator::Css(selectors::CITY_DROPDOWN_ID))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;
    sleep(Duration::from_secs(2)).await;

    for city in selectors::CITY_OPTIONS {
        let option = client.find(Locator::XPath(city)).await.map_err(wd)?;
        sleep(Duration::from_secs(1)).await;
        click_via_script(client, &option).await?;
    }

    dismiss_floating_menu(client, dialog).await
}

async fn select_all_stores(client: &Client, dialog: &Element) -> Result<()> {
    let button = client
        .find(Locator::XPath(selectors::DIALOG_STORE_BUTTON))
        .await
        .map_err(wd)?;
    click_via_script(client, &button).await?;
    sleep(Duration::from_secs(1)).await;

    let stores = dialog
        .find_all(Locator::XPath(selectors::STORE_MENU_ITEMS))
        .await
        .map_err(wd)?;
    for store in stores {
        store.click().await.map_err(wd)?;
    }

    dismiss_floating_menu(client, dialog).await
}

/// The supplier picker is virtualized: only a window of entries exists in
/// the DOM at a time. Select what is visible, scroll, repeat until a full
/// pass adds nothing new.
async fn select_all_suppliers(client: &Client, dialog: &Element) -> Result<()> {
    let button = client
        .find(Locator::XPath(selectors::DIALOG_SUPPLIER_BUTTON))
        .await
        .map_err(wd)?;
    click_via_script(client, &button).await?;
    sleep(Duration::from_secs(1)).await;

    let modal = client
        .find(Locator::XPath(selectors::SUPPLIER_MODAL))
        .await
        .map_err(wd)?;

    let mut selected: BTreeSet<String> = BTreeSet::from(["All".to_string()]);
    loop {
        let items = dialog
            .find_all(Locator::XPath(selectors::SUPPLIER_MENU_ITEMS))
            .await
            .map_err(wd)?;
        sleep(Duration::from_secs(1)).await;
        if items.is_empty() {
            break;
        }

        let mut added = false;
        for item in items {
            let label = item.text().await.map_err(wd)?;
            if !selected.contains(&label) {
                item.click().await.map_err(wd)?;
                selected.insert(label);
                added = true;
            }
        }
        if !added {
            break;
        }

        client
            .execute(
                "arguments[0].scrollTop = arguments[0].scrollTop + arguments[0].offsetHeight;",
                vec![serde_json::to_value(&modal)?],
            )
            .await
            .map_err(wd)?;
        sleep(Duration::from_secs(1)).await;
    }

    info!("{} suppliers selected", selected.len().saturating_sub(1));
    dismiss_floating_menu(client, dialog).await
}

/// The report must cover today's orders; a stale prefilled date means the
/// portal is in an unexpected state and the run must not continue.
async fn verify_report_date(dialog: &Element) -> Result<()> {
    let input = dialog
        .find(Locator::XPath(selectors::REPORT_DATE_INPUT))
        .await
        .map_err(|_| AppError::structural("portal", "report date field not found"))?;

    let value = input.prop("value").await.map_err(wd)?.unwrap_or_default();
    let report_date = value.get(..10).unwrap_or(&value);
    let today = utils::business_now().format("%d/%m/%Y").to_string();

    if report_date != today {
        return Err(AppError::business_rule(format!(
            "report date {report_date} does not match the current date {today}"
        )));
    }
    Ok(())
}

/// Floating menus stay open after selection and cover the form; hovering
/// over the generate label and clicking closes them.
async fn dismiss_floating_menu(client: &Client, dialog: &Element) -> Result<()> {
    let target = dialog
        .find(Locator::XPath(selectors::GENERATE_LABEL))
        .await
        .map_err(wd)?;

    let mouse = MouseActions::new("mouse".to_string())
        .then(PointerAction::MoveToElement {
            element: target,
            duration: None,
            x: 0,
            y: 0,
        })
        .then(PointerAction::Down {
            button: MOUSE_BUTTON_LEFT,
        })
        .then(PointerAction::Up {
            button: MOUSE_BUTTON_LEFT,
        });
    client.perform_actions(mouse).await.map_err(wd)?;
    Ok(())
}
