//! Data models and configuration.

pub mod config;
pub mod transaction;

pub use config::TallyConfig;
pub use transaction::{Category, Transaction};
