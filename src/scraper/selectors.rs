//! Portal DOM selectors.
//!
//! The warehouse portal is a React app with generated ids and no stable
//! test hooks, so most of these are positional XPath. They break when the
//! portal redeploys with layout changes; keeping them in one place makes
//! the repair a one-file edit.

/// Login form.
pub const USERNAME_INPUT: &str = "input#username";
pub const PASSWORD_INPUT: &str =
    r#"//*[@id="root"]/div/div[1]/div/div[2]/div/form/div[2]/div/input"#;
pub const LOGIN_BUTTON: &str = r#"//*[@id="root"]/div/div[1]/div/div[2]/div/form/button"#;

/// Sidebar link to the delivery orders page.
pub const DELIVERY_ORDERS_LINK: &str =
    r#"//*[@id="main-content-box"]/div/aside/div[2]/div/div[1]/ul[1]/li[8]/a"#;

/// The "Tomorrow and later" tab; the label is verified before clicking.
pub const TOMORROW_TAB: &str =
    r#"//*[@id="main-content-box"]/div/div[2]/div/div[2]/div/div[3]/div"#;
pub const TOMORROW_TAB_LABEL: &str = "Tomorrow and later";

/// Store filter dropdown on the orders page.
pub const STORE_FILTER_BUTTON: &str = r#"//*[@id="main-content-box"]/div/div[2]/div/div[3]/div[1]/div/div/div[1]/div/div/span/button"#;
pub const STORE_MENU_ITEMS: &str = r#"//div[@id="store-select-menu"]/div/div/ul/li"#;

/// Page heading, clicked to dismiss floating menus.
pub const PAGE_HEADING: &str = r#"//*[@id="main-content-box"]/div/div[2]/div/div[1]/h3"#;

/// Order table rows; only rows carrying `data-key` are data rows.
pub const ORDER_ROWS: &str = "//tr";
pub const ROW_CELLS: &str = ".//td";
pub const SUPPLIER_CELL_TEXT: &str = ".//a/div/div/div";
pub const CELL_TEXT: &str = ".//a/div";

/// Report dialog.
pub const REPORT_BUTTON: &str =
    r#"//*[@id="main-content-box"]/div/div[2]/div/div[1]/div/button[1]"#;
pub const REPORT_DIALOG: &str = "/html/body/div[4]/div[3]/div";
pub const RADIO_INPUTS: &str = ".//input[@type='radio']";
pub const BULK_EXPORT_RADIO_VALUE: &str = "bulk_po";
pub const FORMAT_DROPDOWN: &str = r#".//button[contains(@id, "kalep-select-react-") and contains(@id, "-toggle-button")]"#;
pub const FORMAT_CSV_OPTION: &str = r#"//*[text()="CSV"]"#;
pub const CHECKBOX_INPUTS: &str = r#"//input[@type="checkbox"]"#;

/// City filter inside the report dialog.
pub const CITY_DROPDOWN_ID: &str = "#city-multi-select-toggle-button";
pub const CITY_OPTIONS: [&str; 2] = [
    r#"//*[text()="Cluj-Napoca"]"#,
    r#"//*[text()="Bucharest"]"#,
];

/// Store and supplier pickers inside the report dialog.
pub const DIALOG_STORE_BUTTON: &str =
    r#"//*[@id="storeSelectBox"]/div/div/div/div/span/button"#;
pub const DIALOG_SUPPLIER_BUTTON: &str =
    r#"//*[@id="supplierSelectBox"]/div/div/div/div/div/span/button"#;
pub const SUPPLIER_MODAL: &str = r#"//div[@data-overlay-container="true"]/div/div"#;
pub const SUPPLIER_MENU_ITEMS: &str = r#"//div[@id="supplier-select-menu"]/div/div/ul/li"#;

/// "Generate report" label, also used as a hover target to close menus.
pub const GENERATE_LABEL: &str = r#"//span[text()="Generate report"]"#;

/// Report date field; its value must equal the current business date.
pub const REPORT_DATE_INPUT: &str =
    r#"//input[contains(@id,"mui-") and @placeholder = "dd/mm/yyyy"]"#;

/// Zip toggle and the dialog's action buttons.
pub const ZIP_CHECKBOX: &str =
    "/html/body/div[4]/div[3]/div/form/div[1]/div/div[5]/label/span[1]/input";
pub const CANCEL_BUTTON: &str = "/html/body/div[4]/div[3]/div/form/div[2]/button[1]";
pub const GENERATE_BUTTON: &str = "/html/body/div[4]/div[3]/div/form/div[2]/button[2]";

/// Export field checkboxes by `name` attribute and the state each one must
/// end up in. "provicer_id" is the portal's own spelling.
pub const REPORT_FIELDS: [(&str, bool); 20] = [
    ("po_number", true),
    ("store_address", false),
    ("price", false),
    ("product_name", true),
    ("provicer_id", true),
    ("plan_qty", true),
    ("fact_qty", false),
    ("supplier_name", true),
    ("supplier_id", false),
    ("edi_store_code", false),
    ("unit", true),
    ("edi_supplier_code", false),
    ("bolt_sku", true),
    ("delivery_date", true),
    ("created_date", false),
    ("supplier_sku", true),
    ("total_sum", false),
    ("store_name", true),
    ("ean", true),
    ("total_with_vat_sum", false),
];

/// The "Select all" master checkbox; always turned off first.
pub const SELECT_ALL_FIELD: &str = "Select all";

/// File name the browser saves the bulk export under.
pub const DOWNLOAD_FILE_NAME: &str = "Bulk PO.zip";
