use crate::models::InvoiceStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Free-form invoice draft as submitted by the UI: one client, one or more
/// pet groups, each with one or more line items.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    #[validate(length(min = 1, message = "clientName is required"))]
    pub client_name: String,
    pub contact_info: Option<String>,
    /// Defaults to today's date (UTC) when omitted.
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[validate(length(min = 1, message = "at least one pet is required"), nested)]
    pub pets: Vec<PetGroup>,
}

impl InvoiceDraft {
    /// Grand total over every pet group, summed without intermediate
    /// rounding. Uses the operator-entered unit price, never the catalog
    /// price.
    pub fn total(&self) -> f64 {
        self.pets
            .iter()
            .flat_map(|group| &group.items)
            .map(|item| item.quantity * item.unit_price)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PetGroup {
    #[validate(length(min = 1, message = "petName is required"))]
    pub pet_name: String,
    pub pet_species: Option<String>,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<DraftItem>,
}

/// A line item references either a catalog product or carries an ad-hoc
/// custom name.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    #[validate(range(min = 1))]
    pub product_id: Option<i64>,
    pub custom_name: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "quantity must be positive"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "unitPrice must not be negative"))]
    pub unit_price: f64,
}

/// Result of a create or update, echoed back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceWriteResult {
    pub invoice_id: i64,
    pub friendly_id: String,
    pub total: f64,
    pub warnings: Vec<String>,
}

/// Listing row: invoice header joined with client name and the distinct
/// pet names on its items.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceSummary {
    pub id: i64,
    pub friendly_id: String,
    pub date: NaiveDate,
    pub status: String,
    pub total_amount: f64,
    pub client_name: String,
    pub pet_names: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceHeader {
    pub id: i64,
    pub friendly_id: String,
    pub date: NaiveDate,
    pub status: String,
    pub total_amount: f64,
    pub client_id: i64,
    pub client_name: String,
    pub contact_info: Option<String>,
}

/// Line item joined with the associated pet's name and species.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceItemRow {
    pub id: i64,
    pub pet_id: Option<i64>,
    pub product_id: Option<i64>,
    pub product_name_snapshot: String,
    pub quantity: f64,
    pub price_snapshot: f64,
    pub pet_name: Option<String>,
    pub pet_species: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: InvoiceHeader,
    pub items: Vec<InvoiceItemRow>,
}
