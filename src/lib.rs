// src/lib.rs

//! Purchase-Order Dispatch Robot Library

pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod pipeline;
pub mod scraper;
pub mod storage;
pub mod table;
pub mod utils;
