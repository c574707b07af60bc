//! Spreadsheet column layout derived from the exposure-information schema.
//!
//! The schema is a JSON document whose `properties` carry a `_role` tag
//! (`user` or `system`) and, for user fields, an `_order` position. The
//! user-editable columns are those fields sorted by `_order`; the orders must
//! form the contiguous sequence `1..=N`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

pub const PTX_ID_LABEL: &str = "ptx_id";
pub const COMPOUND_HASH_LABEL: &str = "compound_hash";
pub const COMPOUND_NAME_LABEL: &str = "compound_name";
pub const DOSE_LABEL: &str = "dose";
pub const TIMEPOINT_LABEL: &str = "timepoint_level";
pub const TIMEPOINT_HOURS_LABEL: &str = "timepoint_(hours)";
pub const REPLICATE_LABEL: &str = "replicate";
pub const BATCH_LABEL: &str = "exposure_batch";

pub const GENERAL_SHEET_NAME: &str = "General Information";
pub const EXPOSURE_SHEET_NAME: &str = "Exposure information";

/// Header row of the "General Information" sheet.
pub const GENERAL_SHEET_COLUMNS: [&str; 10] = [
    "partner_id",
    "biosystem_name",
    BATCH_LABEL,
    "control",
    "replicates",
    "blanks",
    "exposure_batch_startdate",
    "exposure_batch_enddate",
    "timepoints",
    "compound_vehicle",
];

const DEFAULT_EXPOSURE_SCHEMA: &str = include_str!("../schemas/exposure_information.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    User,
    System,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldMeta {
    #[serde(rename = "_role")]
    pub role: FieldRole,
    #[serde(rename = "_order", default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetSchema {
    pub properties: BTreeMap<String, FieldMeta>,
}

impl SheetSchema {
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Configuration(format!("Invalid sheet schema: {}", e)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!(
                "Failed to read sheet schema {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    /// The exposure-information schema shipped with the crate.
    pub fn embedded() -> Result<Self, AppError> {
        Self::from_json(DEFAULT_EXPOSURE_SCHEMA)
    }
}

/// Validated column layout of the sample sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnModel {
    user_columns: Vec<String>,
}

impl ColumnModel {
    /// Build the model, rejecting user fields whose `_order` values are not
    /// exactly `1..=N`.
    pub fn from_schema(schema: &SheetSchema) -> Result<Self, AppError> {
        let mut ordered: Vec<(u32, &str)> = Vec::new();
        for (name, meta) in &schema.properties {
            if meta.role != FieldRole::User {
                continue;
            }
            let order = meta.order.ok_or_else(|| {
                AppError::Configuration(format!("User field '{}' has no _order", name))
            })?;
            ordered.push((order, name.as_str()));
        }
        ordered.sort_by_key(|(order, _)| *order);

        for (index, (order, name)) in ordered.iter().enumerate() {
            let expected = index as u32 + 1;
            if *order != expected {
                return Err(AppError::Configuration(format!(
                    "User field '{}' has _order {} but position {} expects {}",
                    name, order, index, expected
                )));
            }
        }

        Ok(Self {
            user_columns: ordered.into_iter().map(|(_, name)| name.to_string()).collect(),
        })
    }

    /// User-editable columns, left empty in generated sheets.
    pub fn user_columns(&self) -> &[String] {
        &self.user_columns
    }

    /// Full header row of the "Exposure information" sheet.
    pub fn sample_sheet_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.user_columns.len() + 7);
        columns.push(PTX_ID_LABEL.to_string());
        columns.push(COMPOUND_HASH_LABEL.to_string());
        columns.extend(self.user_columns.iter().cloned());
        for label in [
            REPLICATE_LABEL,
            COMPOUND_NAME_LABEL,
            DOSE_LABEL,
            TIMEPOINT_LABEL,
            TIMEPOINT_HOURS_LABEL,
        ] {
            columns.push(label.to_string());
        }
        columns
    }
}
