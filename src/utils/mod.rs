//! Utility functions and helpers.

pub mod archive;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Europe::Bucharest;

/// Current time in the business timezone.
pub fn business_now() -> DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&Bucharest)
}

/// ISO weekday of the current business day (Mon=1..Sun=7).
pub fn business_weekday() -> u32 {
    business_now().weekday().number_from_monday()
}

/// Insert a timestamp before a key's extension:
/// `input/mail_bag.json` → `input/mail_bag(12-03-2024T06:30).json`.
pub fn stamp_key(key: &str, stamp: &str) -> String {
    match key.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}({stamp}).{ext}"),
        None => format!("{key}({stamp})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_goes_before_the_extension() {
        assert_eq!(
            stamp_key("purchasing-orders/input/bulk_po.zip", "12-03-2024T06:30"),
            "purchasing-orders/input/bulk_po(12-03-2024T06:30).zip"
        );
    }

    #[test]
    fn keys_without_extension_get_a_suffix() {
        assert_eq!(stamp_key("some/key", "s"), "some/key(s)");
    }

    #[test]
    fn business_weekday_is_in_iso_range() {
        let day = business_weekday();
        assert!((1..=7).contains(&day));
    }
}
