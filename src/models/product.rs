use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog product or service, unique by name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
}
