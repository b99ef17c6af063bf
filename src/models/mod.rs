// src/models/mod.rs

//! Domain models for the dispatch robot.
//!
//! This module contains the data structures flowing between pipeline stages,
//! organized by their primary purpose.

mod bag;
mod mailing;
mod mapping;
mod mov;
mod orders;
mod report;
mod schedule;

// Re-export all public types
pub use bag::{DispatchRow, MailBag};
pub use mailing::{MailingEntry, MailingList};
pub use mapping::NameMap;
pub use mov::{MovPartition, MovRecord};
pub use orders::{extract_supplier, group_by_supplier, store_particle};
pub use report::{Discrepancies, FunctionReply};
pub use schedule::{Schedule, ScheduleRow};
