use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct VetmsConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory holding the SQLite database file.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Prefix for human-readable invoice ids, e.g. "MBV" -> "MBV-0001".
    #[serde(default = "default_invoice_prefix")]
    pub invoice_prefix: String,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_invoice_prefix() -> String {
    "MBV".to_string()
}

impl Default for VetmsConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            data_dir: default_data_dir(),
            max_connections: default_max_connections(),
            invoice_prefix: default_invoice_prefix(),
        }
    }
}

impl VetmsConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("VETMS").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("vetms.sqlite")
    }
}
