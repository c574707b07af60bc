use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Organism {
    pub organism_id: i32,
    pub ptox_biosystem_name: String,
    pub scientific_name: Option<String>,
    pub ptox_biosystem_code: String,
}

/// Seed payload for an organism.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewOrganism {
    #[validate(length(min = 1, max = 255))]
    pub ptox_biosystem_name: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[validate(length(equal = 1, message = "ptox_biosystem_code must be a single letter"))]
    pub ptox_biosystem_code: String,
}
