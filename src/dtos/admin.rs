use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientBody {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductBody {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsvImportBody {
    pub csv: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CsvImportReport {
    pub ok: bool,
    pub processed: u32,
    pub skipped: u32,
}
