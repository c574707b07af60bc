use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use crate::error::AppError;
use crate::mappings::{self, DoseKey};

/// A dose level attached to files. `label` is the single-letter dose code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Dose {
    pub dose_id: i32,
    pub value: String,
    pub unit: String,
    pub label: String,
}

/// Dose fields derived from a spreadsheet dose level, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDose {
    pub value: String,
    pub unit: String,
    pub label: String,
}

impl NewDose {
    pub fn from_level(level: &str) -> Result<Self, AppError> {
        let code = mappings::dose_code(DoseKey::Text(level))?;
        let (value, unit) = mappings::split_dose_level(level);
        Ok(Self {
            value,
            unit,
            label: code.to_string(),
        })
    }
}

/// An elapsed-hours offset at which samples are collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Timepoint {
    pub timepoint_id: i32,
    pub value: i32,
    pub unit: String,
    pub label: String,
}

impl Timepoint {
    /// Single-letter code of this timepoint's label.
    pub fn code(&self) -> Result<char, AppError> {
        mappings::timepoint_code(&self.label)
    }
}

pub const TIMEPOINT_UNIT: &str = "hours";
