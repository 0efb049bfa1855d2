//! HTTP handlers for vetms-api.

pub mod clients;
pub mod health;
pub mod invoices;
pub mod pets;
pub mod products;
