//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Static monastery catalog

pub mod catalog;
mod database;
mod models;

pub use catalog::MonasteryRecord;
pub use database::Database;
pub use models::*;
