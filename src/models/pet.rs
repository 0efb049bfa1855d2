use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Pet owned by a client. Names are unique per client, not globally.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub species: Option<String>,
    pub client_id: i64,
}
