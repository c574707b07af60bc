use std::collections::BTreeMap;

use validator::Validate;

use super::chemical::Chemical;
use super::dose::{Dose, Timepoint};
use super::file::NewFile;
use super::organisation::Organisation;
use super::organism::Organism;
use crate::error::AppError;
use crate::lifecycle::parse_date;

/// Normalised content of one exposure spreadsheet. Transient: it only exists
/// to build a [`NewFile`].
#[derive(Debug, Clone, Validate)]
pub struct ExtractionRecord {
    #[validate(range(min = 1, message = "replicates must be positive"))]
    pub replicates: i32,
    #[validate(range(min = 1, message = "controls must be positive"))]
    pub controls: i32,
    #[validate(range(min = 1, message = "blanks must be positive"))]
    pub blanks: i32,
    pub vehicle_name: String,
    pub timepoints: Vec<Timepoint>,
    /// Resolved chemicals keyed by common name.
    pub chemicals: BTreeMap<String, Chemical>,
    pub doses: Vec<Dose>,
    pub organism_name: String,
    #[validate(length(equal = 2, message = "batch must be two characters"))]
    pub batch: String,
    pub organisation_name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Entities the record's names resolve to.
#[derive(Debug, Clone)]
pub struct ResolvedReferences {
    pub organisation: Organisation,
    pub organism: Organism,
    pub vehicle: Chemical,
}

impl NewFile {
    pub fn from_extraction(
        record: ExtractionRecord,
        references: &ResolvedReferences,
        gdrive_id: String,
        name: Option<String>,
        author_id: i32,
    ) -> Result<Self, AppError> {
        record.validate()?;
        let start_date = parse_date(&record.start_date)?;
        let end_date = parse_date(&record.end_date)?;
        if end_date < start_date {
            return Err(AppError::OrderingViolation(format!(
                "Batch {} ends ({}) before it starts ({})",
                record.batch, record.end_date, record.start_date
            )));
        }

        Ok(NewFile {
            gdrive_id,
            name,
            batch: record.batch,
            replicates: record.replicates,
            controls: record.controls,
            blanks: record.blanks,
            start_date,
            end_date,
            organisation_id: references.organisation.organisation_id,
            author_id,
            organism_id: references.organism.organism_id,
            vehicle_id: references.vehicle.chemical_id,
            chemicals: record.chemicals.into_values().collect(),
            doses: record.doses,
            timepoints: record.timepoints,
        })
    }
}
