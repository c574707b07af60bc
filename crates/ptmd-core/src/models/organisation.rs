use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// A partner organisation. `gdrive_id` points at its folder on the drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Organisation {
    pub organisation_id: i32,
    pub name: String,
    pub gdrive_id: Option<String>,
    pub longname: Option<String>,
}

/// Seed payload for an organisation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewOrganisation {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub gdrive_id: Option<String>,
    #[serde(default)]
    pub longname: Option<String>,
}
