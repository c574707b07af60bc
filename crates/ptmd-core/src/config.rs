//! Configuration module
//!
//! Settings are read from the environment (and `.env` when present) once at
//! startup. The sheet schema is loaded and turned into a [`ColumnModel`] at the
//! same time so a malformed schema stops the process before any request runs.

use std::env;

use crate::schema::{ColumnModel, SheetSchema};
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const BLANKS_MIN: i32 = 1;
const BLANKS_MAX: i32 = 20;
const GDRIVE_API_BASE: &str = "https://www.googleapis.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    /// Pre-issued OAuth access token for the Drive API.
    pub gdrive_access_token: Option<String>,
    pub gdrive_api_base: String,
    pub sheet_schema_path: Option<String>,
    pub column_model: ColumnModel,
    pub blanks_min: i32,
    pub blanks_max: i32,
    /// Partner ids accepted by the validator. Empty accepts any partner.
    pub allowed_partners: Vec<String>,
    /// Vehicle names accepted by the validator. Empty accepts any vehicle.
    pub allowed_vehicles: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::GoogleDrive,
        };

        let sheet_schema_path = lookup("SHEET_SCHEMA_PATH");
        let column_model = load_column_model(sheet_schema_path.as_deref())?;

        let config = Config {
            environment,
            database_url,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            gdrive_access_token: lookup("GDRIVE_ACCESS_TOKEN"),
            gdrive_api_base: lookup("GDRIVE_API_BASE")
                .unwrap_or_else(|| GDRIVE_API_BASE.to_string()),
            sheet_schema_path,
            column_model,
            blanks_min: parse_or(&lookup, "BLANKS_MIN", BLANKS_MIN)?,
            blanks_max: parse_or(&lookup, "BLANKS_MAX", BLANKS_MAX)?,
            allowed_partners: split_list(lookup("ALLOWED_PARTNERS")),
            allowed_vehicles: split_list(lookup("ALLOWED_VEHICLES")),
        };

        Ok(config)
    }

    /// Load only the sheet column model. Needs no database settings.
    pub fn column_model_from_env() -> Result<ColumnModel, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::column_model_from_lookup(|key| env::var(key).ok())
    }

    pub fn column_model_from_lookup<F>(lookup: F) -> Result<ColumnModel, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        load_column_model(lookup("SHEET_SCHEMA_PATH").as_deref())
    }

    /// Whether client-facing output should hide internal error details.
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.blanks_min < 1 || self.blanks_max < self.blanks_min {
            return Err(anyhow::anyhow!(
                "BLANKS_MIN must be at least 1 and not greater than BLANKS_MAX"
            ));
        }

        match self.storage_backend {
            StorageBackend::GoogleDrive => {
                if self.gdrive_access_token.is_none() {
                    return Err(anyhow::anyhow!(
                        "GDRIVE_ACCESS_TOKEN must be set when using the gdrive storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn load_column_model(path: Option<&str>) -> Result<ColumnModel, anyhow::Error> {
    let schema = match path {
        Some(path) => SheetSchema::from_path(path)?,
        None => SheetSchema::embedded()?,
    };
    let column_model = ColumnModel::from_schema(&schema)?;
    tracing::debug!(
        path = path.unwrap_or("embedded"),
        user_columns = column_model.user_columns().len(),
        "Sheet schema loaded"
    );
    Ok(column_model)
}

fn parse_or<F>(lookup: &F, key: &str, default: i32) -> Result<i32, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
