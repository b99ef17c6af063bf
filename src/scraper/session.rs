//! Login, navigation and MOV collection.

use std::time::Duration;

use fantoccini::{Client, Locator};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::{Secrets, Settings};
use crate::error::{AppError, Result};
use crate::models::MovRecord;
use crate::scraper::{selectors, wd};

/// Log into the portal with the robot account.
pub async fn login(client: &Client, settings: &Settings, secrets: &Secrets) -> Result<()> {
    client.goto(&settings.portal_url).await.map_err(wd)?;
    sleep(Duration::from_secs(5)).await;

    client
        .wait()
        .at_most(settings.element_wait)
        .for_element(Locator::Css(selectors::USERNAME_INPUT))
        .await
        .map_err(wd)?
        .send_keys(&secrets.portal_user)
        .await
        .map_err(wd)?;

    client
        .wait()
        .at_most(settings.element_wait)
        .for_element(Locator::XPath(selectors::PASSWORD_INPUT))
        .await
        .map_err(wd)?
        .send_keys(&secrets.portal_pass)
        .await
        .map_err(wd)?;

    let login = client
        .find(Locator::XPath(selectors::LOGIN_BUTTON))
        .await
        .map_err(wd)?;
    sleep(Duration::from_secs(1)).await;
    login.click().await.map_err(wd)?;

    info!("portal login submitted");
    Ok(())
}

/// Navigate to the delivery orders page and its "Tomorrow and later" tab.
pub async fn open_delivery_orders(client: &Client, settings: &Settings) -> Result<()> {
    client
        .wait()
        .at_most(settings.element_wait)
        .for_element(Locator::XPath(selectors::DELIVERY_ORDERS_LINK))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;
    sleep(Duration::from_secs(1)).await;

    let tab = client
        .find(Locator::XPath(selectors::TOMORROW_TAB))
        .await
        .map_err(wd)?;
    let label = tab.html(true).await.map_err(wd)?;
    if label != selectors::TOMORROW_TAB_LABEL {
        return Err(AppError::structural(
            "portal",
            format!("expected the upcoming-orders tab, found {label:?}"),
        ));
    }
    tab.click().await.map_err(wd)?;
    sleep(Duration::from_secs(1)).await;

    info!("delivery orders page open");
    Ok(())
}

/// Walk the store filter one store at a time and read the MOV column of
/// every order row.
pub async fn collect_mov(client: &Client) -> Result<Vec<MovRecord>> {
    let filter = client
        .find(Locator::XPath(selectors::STORE_FILTER_BUTTON))
        .await
        .map_err(wd)?;
    filter.click().await.map_err(wd)?;

    let stores = client
        .find_all(Locator::XPath(selectors::STORE_MENU_ITEMS))
        .await
        .map_err(wd)?;
    sleep(Duration::from_secs(1)).await;
    let store_count = stores.len();

    client
        .find(Locator::XPath(selectors::PAGE_HEADING))
        .await
        .map_err(wd)?
        .click()
        .await
        .map_err(wd)?;

    let mut records = Vec::new();
    for index in 0..store_count {
        // the first pass reads the default store; after that, swap the
        // selected store in the filter menu
        if index != 0 {
            client
                .find(Locator::XPath(selectors::STORE_FILTER_BUTTON))
                .await
                .map_err(wd)?
                .click()
                .await
                .map_err(wd)?;
            sleep(Duration::from_secs(1)).await;

            let items = client
                .find_all(Locator::XPath(selectors::STORE_MENU_ITEMS))
                .await
                .map_err(wd)?;
            menu_item(&items, index)?.click().await.map_err(wd)?;
            sleep(Duration::from_secs(1)).await;

            let items = client
                .find_all(Locator::XPath(selectors::STORE_MENU_ITEMS))
                .await
                .map_err(wd)?;
            menu_item(&items, index - 1)?.click().await.map_err(wd)?;
            sleep(Duration::from_secs(1)).await;

            client
                .find(Locator::XPath(selectors::PAGE_HEADING))
                .await
                .map_err(wd)?
                .click()
                .await
                .map_err(wd)?;
        }

        let before = records.len();
        read_order_rows(client, &mut records).await?;
        debug!("store {} contributed {} rows", index, records.len() - before);
    }

    Ok(records)
}

async fn read_order_rows(client: &Client, records: &mut Vec<MovRecord>) -> Result<()> {
    let rows = client
        .find_all(Locator::XPath(selectors::ORDER_ROWS))
        .await
        .map_err(wd)?;

    for row in rows {
        if row.attr("data-key").await.map_err(wd)?.is_none() {
            continue;
        }
        let cells = row
            .find_all(Locator::XPath(selectors::ROW_CELLS))
            .await
            .map_err(wd)?;
        if cells.len() < 8 {
            continue;
        }

        let supplier = cells[2]
            .find(Locator::XPath(selectors::SUPPLIER_CELL_TEXT))
            .await
            .map_err(wd)?
            .html(true)
            .await
            .map_err(wd)?;
        let store = cells[6]
            .find(Locator::XPath(selectors::CELL_TEXT))
            .await
            .map_err(wd)?
            .html(true)
            .await
            .map_err(wd)?;
        let mov_html = cells[7]
            .find(Locator::XPath(selectors::CELL_TEXT))
            .await
            .map_err(wd)?
            .html(true)
            .await
            .map_err(wd)?;

        let (has_mov, mov) = parse_mov_cell(&mov_html);
        records.push(MovRecord {
            supplier,
            store,
            has_mov,
            mov,
        });
    }
    Ok(())
}

/// The MOV cell renders the plain figure when the minimum is met and wraps
/// it in warning markup starting with `<` when it is not.
pub(crate) fn parse_mov_cell(html: &str) -> (bool, String) {
    if html.starts_with('<') {
        let value = html.rsplit('>').next().unwrap_or_default();
        (false, value.to_string())
    } else {
        (true, html.to_string())
    }
}

fn menu_item<'e>(
    items: &'e [fantoccini::elements::Element],
    index: usize,
) -> Result<&'e fantoccini::elements::Element> {
    items.get(index).ok_or_else(|| {
        AppError::structural("portal", format!("store menu has no entry {index}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mov_cell_plain_value_means_minimum_met() {
        assert_eq!(parse_mov_cell("120 RON"), (true, "120 RON".to_string()));
    }

    #[test]
    fn mov_cell_markup_means_minimum_not_met() {
        let html = r#"<span class="warn">55 RON"#;
        assert_eq!(parse_mov_cell(html), (false, "55 RON".to_string()));
    }
}
