//! Supplier delivery schedule (the "cadentar").

use serde::Deserialize;

use crate::error::{AppError, Result};

/// One supplier's row in the delivery schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    /// Supplier name as spelled in the scheduling system
    pub supplier_cad: String,

    /// Day-of-week flags, Monday first
    pub days: [bool; 7],

    /// Master enable flag; suppliers with this off are never dispatched
    pub has_go: bool,
}

impl ScheduleRow {
    /// Whether the supplier is scheduled on the given ISO weekday (Mon=1..Sun=7).
    pub fn is_scheduled(&self, iso_weekday: u32) -> bool {
        matches!(iso_weekday, 1..=7) && self.days[(iso_weekday - 1) as usize]
    }
}

/// The full delivery schedule, read-only input maintained outside the robot.
#[derive(Debug, Clone)]
pub struct Schedule {
    rows: Vec<ScheduleRow>,
}

/// Wire shape of one schedule CSV record.
#[derive(Debug, Deserialize)]
struct RawScheduleRecord {
    supplier: String,
    mon: String,
    tue: String,
    wed: String,
    thu: String,
    fri: String,
    sat: String,
    sun: String,
    enabled: String,
}

impl Schedule {
    /// Parse the schedule CSV. Day cells are marked with `X`; the enabled
    /// column accepts the usual truthy spellings.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(bytes);
        let mut rows = Vec::new();

        for record in reader.deserialize::<RawScheduleRecord>() {
            let record = record.map_err(|e| AppError::structural("schedule", e))?;
            rows.push(ScheduleRow {
                supplier_cad: record.supplier.trim().to_string(),
                days: [
                    day_flag(&record.mon),
                    day_flag(&record.tue),
                    day_flag(&record.wed),
                    day_flag(&record.thu),
                    day_flag(&record.fri),
                    day_flag(&record.sat),
                    day_flag(&record.sun),
                ],
                has_go: truthy(&record.enabled),
            });
        }

        Ok(Self { rows })
    }

    /// Suppliers scheduled on the given ISO weekday with the enable flag set.
    pub fn scheduled_on(&self, iso_weekday: u32) -> Vec<&ScheduleRow> {
        self.rows
            .iter()
            .filter(|row| row.has_go && row.is_scheduled(iso_weekday))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn day_flag(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case("x")
}

fn truthy(cell: &str) -> bool {
    matches!(
        cell.trim().to_lowercase().as_str(),
        "true" | "1" | "x" | "da" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
supplier,mon,tue,wed,thu,fri,sat,sun,enabled
ACME SRL ,X,,X,,X,,,true
DORMANT SRL,X,X,X,X,X,X,X,false
WEEKEND SRL,,,,,,X,X,da
";

    #[test]
    fn scheduled_on_filters_day_and_enable_flag() {
        let schedule = Schedule::from_csv(CSV.as_bytes()).unwrap();
        assert_eq!(schedule.len(), 3);

        // Monday: ACME is on, DORMANT is disabled, WEEKEND is off
        let monday = schedule.scheduled_on(1);
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].supplier_cad, "ACME SRL");

        // Saturday: only WEEKEND
        let saturday = schedule.scheduled_on(6);
        assert_eq!(saturday.len(), 1);
        assert_eq!(saturday[0].supplier_cad, "WEEKEND SRL");
    }

    #[test]
    fn supplier_names_are_trimmed() {
        let schedule = Schedule::from_csv(CSV.as_bytes()).unwrap();
        let monday = schedule.scheduled_on(1);
        assert_eq!(monday[0].supplier_cad, "ACME SRL");
    }

    #[test]
    fn out_of_range_weekday_matches_nothing() {
        let row = ScheduleRow {
            supplier_cad: "X".into(),
            days: [true; 7],
            has_go: true,
        };
        assert!(!row.is_scheduled(0));
        assert!(!row.is_scheduled(8));
    }
}
