//! Domain models for vetms-api.

mod client;
mod invoice;
mod pet;
mod product;

pub use client::Client;
pub use invoice::InvoiceStatus;
pub use pet::Pet;
pub use product::Product;
