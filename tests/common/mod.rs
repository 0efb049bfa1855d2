#![allow(dead_code)]

use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use vetms_api::dtos::{DraftItem, InvoiceDraft, PetGroup};
use vetms_api::models::InvoiceStatus;
use vetms_api::services::Database;

/// Fresh in-memory database with the full schema applied. One connection
/// so the memory database lives as long as the pool.
pub async fn test_db() -> Database {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let db = Database::connect(options, 1, "MBV")
        .await
        .expect("connect to in-memory sqlite");
    db.ensure_schema().await.expect("apply schema");
    db
}

pub async fn seed_product(db: &Database, name: &str, price: f64) -> i64 {
    let (product, _) = db.upsert_product(name, price).await.expect("seed product");
    product.id
}

pub async fn count_rows(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .expect("count rows")
}

pub fn catalog_item(product_id: i64, quantity: f64, unit_price: f64) -> DraftItem {
    DraftItem {
        product_id: Some(product_id),
        custom_name: None,
        quantity,
        unit_price,
    }
}

pub fn custom_item(name: &str, quantity: f64, unit_price: f64) -> DraftItem {
    DraftItem {
        product_id: None,
        custom_name: Some(name.to_string()),
        quantity,
        unit_price,
    }
}

pub fn pet_group(name: &str, species: Option<&str>, items: Vec<DraftItem>) -> PetGroup {
    PetGroup {
        pet_name: name.to_string(),
        pet_species: species.map(str::to_string),
        items,
    }
}

pub fn draft(client: &str, pets: Vec<PetGroup>) -> InvoiceDraft {
    InvoiceDraft {
        client_name: client.to_string(),
        contact_info: None,
        date: None,
        status: InvoiceStatus::Draft,
        pets,
    }
}
