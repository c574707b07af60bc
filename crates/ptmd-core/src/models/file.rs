use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::chemical::Chemical;
use super::dose::{Dose, Timepoint};
use super::validation::ValidationReport;
use crate::error::AppError;
use crate::lifecycle::DATE_FORMAT;

/// Outcome of the last validation run, stored as `No`, `success` or `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    #[serde(rename = "No")]
    NotValidated,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failed")]
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::NotValidated => "No",
            ValidationStatus::Success => "success",
            ValidationStatus::Failed => "failed",
        }
    }

    pub fn from_report(report: &ValidationReport) -> Self {
        if report.valid {
            ValidationStatus::Success
        } else {
            ValidationStatus::Failed
        }
    }
}

impl FromStr for ValidationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "No" => Ok(ValidationStatus::NotValidated),
            "success" => Ok(ValidationStatus::Success),
            "failed" => Ok(ValidationStatus::Failed),
            other => Err(AppError::InvalidInput(format!(
                "Unknown validation status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated exposure batch: one uploaded spreadsheet stored on the drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub file_id: i32,
    pub gdrive_id: String,
    pub name: Option<String>,
    pub batch: String,
    pub validated: ValidationStatus,
    pub replicates: i32,
    pub controls: i32,
    pub blanks: i32,
    pub shipped: bool,
    pub received: bool,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub ship_date: Option<NaiveDateTime>,
    pub receive_date: Option<NaiveDateTime>,
    pub organisation_id: i32,
    pub author_id: i32,
    pub organism_id: i32,
    pub vehicle_id: i32,
    pub chemicals: Vec<Chemical>,
    pub doses: Vec<Dose>,
    pub timepoints: Vec<Timepoint>,
}

/// Row of the `file` table, without its many-to-many associations.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct FileRow {
    pub file_id: i32,
    pub gdrive_id: String,
    pub name: Option<String>,
    pub batch: String,
    pub validated: String,
    pub replicates: i32,
    pub controls: i32,
    pub blanks: i32,
    pub shipped: bool,
    pub received: bool,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub ship_date: Option<NaiveDateTime>,
    pub receive_date: Option<NaiveDateTime>,
    pub organisation_id: i32,
    pub author_id: i32,
    pub organism_id: i32,
    pub vehicle_id: i32,
}

impl FileRow {
    pub fn into_file(
        self,
        chemicals: Vec<Chemical>,
        doses: Vec<Dose>,
        timepoints: Vec<Timepoint>,
    ) -> Result<File, AppError> {
        Ok(File {
            file_id: self.file_id,
            gdrive_id: self.gdrive_id,
            name: self.name,
            batch: self.batch,
            validated: self.validated.parse()?,
            replicates: self.replicates,
            controls: self.controls,
            blanks: self.blanks,
            shipped: self.shipped,
            received: self.received,
            start_date: self.start_date,
            end_date: self.end_date,
            ship_date: self.ship_date,
            receive_date: self.receive_date,
            organisation_id: self.organisation_id,
            author_id: self.author_id,
            organism_id: self.organism_id,
            vehicle_id: self.vehicle_id,
            chemicals,
            doses,
            timepoints,
        })
    }
}

/// Insert payload for a new file. References are already resolved to ids.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub gdrive_id: String,
    pub name: Option<String>,
    pub batch: String,
    pub replicates: i32,
    pub controls: i32,
    pub blanks: i32,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub organisation_id: i32,
    pub author_id: i32,
    pub organism_id: i32,
    pub vehicle_id: i32,
    pub chemicals: Vec<Chemical>,
    pub doses: Vec<Dose>,
    pub timepoints: Vec<Timepoint>,
}

/// Filters for file search. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileFilter {
    pub organisation_id: Option<i32>,
    pub author_id: Option<i32>,
    pub batch: Option<String>,
    pub validated: Option<ValidationStatus>,
    pub shipped: Option<bool>,
    pub received: Option<bool>,
}

impl FileFilter {
    pub fn matches(&self, file: &File) -> bool {
        self.organisation_id.map_or(true, |id| file.organisation_id == id)
            && self.author_id.map_or(true, |id| file.author_id == id)
            && self.batch.as_deref().map_or(true, |b| file.batch == b)
            && self.validated.map_or(true, |v| file.validated == v)
            && self.shipped.map_or(true, |s| file.shipped == s)
            && self.received.map_or(true, |r| file.received == r)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseView {
    pub value: String,
    pub unit: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimepointView {
    pub value: i32,
    pub unit: String,
    pub label: String,
}

/// Display names of the rows a file references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileLabels {
    pub organisation: String,
    pub author: String,
    pub organism: String,
    pub vehicle: String,
}

/// Serialised form of a file returned to API callers. Dates are `YYYY-MM-DD`;
/// references carry both their id and their display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileView {
    pub file_id: i32,
    pub gdrive_id: String,
    pub name: Option<String>,
    pub batch: String,
    pub replicates: i32,
    pub controls: i32,
    pub blanks: i32,
    pub shipped: bool,
    pub received: bool,
    pub start_date: String,
    pub end_date: String,
    pub shipment_date: Option<String>,
    pub receive_date: Option<String>,
    pub organisation_id: i32,
    pub organisation: String,
    pub author_id: i32,
    pub author: String,
    pub organism_id: i32,
    pub organism: String,
    pub vehicle_id: i32,
    pub vehicle: String,
    pub chemicals: Vec<String>,
    pub timepoints: Vec<TimepointView>,
    pub validated: ValidationStatus,
    pub doses: Vec<DoseView>,
}

impl FileView {
    pub fn new(file: &File, labels: FileLabels) -> Self {
        let date = |d: &NaiveDateTime| d.format(DATE_FORMAT).to_string();
        FileView {
            file_id: file.file_id,
            gdrive_id: file.gdrive_id.clone(),
            name: file.name.clone(),
            batch: file.batch.clone(),
            replicates: file.replicates,
            controls: file.controls,
            blanks: file.blanks,
            shipped: file.shipped,
            received: file.received,
            start_date: date(&file.start_date),
            end_date: date(&file.end_date),
            shipment_date: file.ship_date.as_ref().map(date),
            receive_date: file.receive_date.as_ref().map(date),
            organisation_id: file.organisation_id,
            organisation: labels.organisation,
            author_id: file.author_id,
            author: labels.author,
            organism_id: file.organism_id,
            organism: labels.organism,
            vehicle_id: file.vehicle_id,
            vehicle: labels.vehicle,
            chemicals: file.chemicals.iter().map(|c| c.common_name.clone()).collect(),
            timepoints: file
                .timepoints
                .iter()
                .map(|t| TimepointView {
                    value: t.value,
                    unit: t.unit.clone(),
                    label: t.label.clone(),
                })
                .collect(),
            validated: file.validated,
            doses: file
                .doses
                .iter()
                .map(|d| DoseView {
                    value: d.value.clone(),
                    unit: d.unit.clone(),
                    label: d.label.clone(),
                })
                .collect(),
        }
    }
}
