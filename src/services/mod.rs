//! Services module for vetms-api.

pub mod catalog;
pub mod clients;
pub mod database;
pub mod invoice;
pub mod metrics;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
