use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Clinic client, unique by trimmed name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub contact_info: Option<String>,
}
