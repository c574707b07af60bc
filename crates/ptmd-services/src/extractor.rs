//! Spreadsheet extraction
//!
//! Turns an uploaded exposure workbook into an [`ExtractionRecord`]. Extraction
//! is fail-fast: the first unreadable field aborts with
//! [`AppError::Extraction`] and no partial record is returned. Name resolution
//! and timepoint/dose normalisation go through the collaborator traits.

use std::collections::BTreeSet;
use std::sync::Arc;

use calamine::Data;
use ptmd_core::models::ExtractionRecord;
use ptmd_core::schema::{COMPOUND_NAME_LABEL, DOSE_LABEL};
use ptmd_core::{AppError, ChemicalResolver, DoseNormalizer, TimepointNormalizer};

use crate::workbook::{cell_date, cell_int, cell_text, cell_timepoints, ExposureWorkbook, SheetTable};

/// Scalar fields of the "General Information" sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralInformation {
    pub partner_id: String,
    pub biosystem_name: String,
    pub batch: String,
    pub controls: i32,
    pub replicates: i32,
    pub blanks: i32,
    pub start_date: String,
    pub end_date: String,
    pub timepoints: Vec<i32>,
    pub vehicle: String,
}

impl GeneralInformation {
    /// Read the first data row of the general sheet.
    pub fn read(sheet: &SheetTable) -> Result<Self, AppError> {
        if sheet.row_count() == 0 {
            return Err(AppError::Extraction(
                "General Information sheet has no data row".to_string(),
            ));
        }

        let hours = cell_timepoints(required(sheet, "timepoints")?).map_err(AppError::Extraction)?;
        let timepoints = hours
            .into_iter()
            .map(|h| {
                i32::try_from(h)
                    .map_err(|_| AppError::Extraction(format!("timepoint {} is out of range", h)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            partner_id: text(sheet, "partner_id")?,
            biosystem_name: text(sheet, "biosystem_name")?,
            batch: text(sheet, "exposure_batch")?,
            controls: count(sheet, "control")?,
            replicates: count(sheet, "replicates")?,
            blanks: count(sheet, "blanks")?,
            start_date: date(sheet, "exposure_batch_startdate")?,
            end_date: date(sheet, "exposure_batch_enddate")?,
            timepoints,
            vehicle: text(sheet, "compound_vehicle")?,
        })
    }
}

fn required<'a>(sheet: &'a SheetTable, column: &str) -> Result<&'a Data, AppError> {
    if sheet.column_index(column).is_none() {
        return Err(AppError::Extraction(format!("Missing column '{}'", column)));
    }
    sheet
        .cell(0, column)
        .filter(|cell| cell_text(cell).is_some())
        .ok_or_else(|| AppError::Extraction(format!("Column '{}' is empty", column)))
}

fn text(sheet: &SheetTable, column: &str) -> Result<String, AppError> {
    required(sheet, column).map(|cell| cell_text(cell).unwrap_or_default())
}

fn count(sheet: &SheetTable, column: &str) -> Result<i32, AppError> {
    let cell = required(sheet, column)?;
    cell_int(cell)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| {
            AppError::Extraction(format!(
                "Column '{}' must be a whole number, got '{}'",
                column,
                cell_text(cell).unwrap_or_default()
            ))
        })
}

fn date(sheet: &SheetTable, column: &str) -> Result<String, AppError> {
    let cell = required(sheet, column)?;
    cell_date(cell).ok_or_else(|| {
        AppError::Extraction(format!(
            "Column '{}' must be a YYYY-MM-DD date, got '{}'",
            column,
            cell_text(cell).unwrap_or_default()
        ))
    })
}

/// Distinct text values of an exposure-sheet column.
fn distinct(sheet: &SheetTable, column: &str) -> Option<BTreeSet<String>> {
    sheet
        .column(column)
        .map(|cells| cells.into_iter().filter_map(cell_text).collect())
}

pub struct SpreadsheetExtractor {
    chemicals: Arc<dyn ChemicalResolver>,
    timepoints: Arc<dyn TimepointNormalizer>,
    doses: Arc<dyn DoseNormalizer>,
}

impl SpreadsheetExtractor {
    pub fn new(
        chemicals: Arc<dyn ChemicalResolver>,
        timepoints: Arc<dyn TimepointNormalizer>,
        doses: Arc<dyn DoseNormalizer>,
    ) -> Self {
        Self {
            chemicals,
            timepoints,
            doses,
        }
    }

    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn extract(&self, data: &[u8]) -> Result<ExtractionRecord, AppError> {
        let workbook = ExposureWorkbook::from_bytes(data)?;
        let general = GeneralInformation::read(&workbook.general)?;

        let names = distinct(&workbook.exposure, COMPOUND_NAME_LABEL).ok_or_else(|| {
            AppError::Extraction(format!("Missing column '{}'", COMPOUND_NAME_LABEL))
        })?;
        let chemicals = self.chemicals.resolve(&names).await?;
        let timepoints = self.timepoints.normalize(&general.timepoints).await?;
        let doses = match distinct(&workbook.exposure, DOSE_LABEL) {
            Some(levels) if !levels.is_empty() => self.doses.normalize(&levels).await?,
            _ => Vec::new(),
        };

        tracing::debug!(
            batch = %general.batch,
            chemicals = chemicals.len(),
            timepoints = timepoints.len(),
            doses = doses.len(),
            "Spreadsheet extracted"
        );

        Ok(ExtractionRecord {
            replicates: general.replicates,
            controls: general.controls,
            blanks: general.blanks,
            vehicle_name: general.vehicle,
            timepoints,
            chemicals,
            doses,
            organism_name: general.biosystem_name,
            batch: general.batch,
            organisation_name: general.partner_id,
            start_date: general.start_date,
            end_date: general.end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(headers: &[&str], row: Vec<Data>) -> SheetTable {
        let mut range = calamine::Range::new((0, 0), (1, headers.len() as u32 - 1));
        for (col, header) in headers.iter().enumerate() {
            range.set_value((0, col as u32), Data::String(header.to_string()));
        }
        for (col, cell) in row.into_iter().enumerate() {
            range.set_value((1, col as u32), cell);
        }
        SheetTable::from_range(&range)
    }

    fn general_row() -> Vec<Data> {
        vec![
            Data::String("UOB".into()),
            Data::String("zebrafish".into()),
            Data::String("AA".into()),
            Data::Float(2.0),
            Data::Float(4.0),
            Data::String("1".into()),
            Data::String("2024-01-01".into()),
            Data::String("2024-01-10".into()),
            Data::String("[0,24,48]".into()),
            Data::String("DMSO".into()),
        ]
    }

    #[test]
    fn reads_general_row() {
        let table = sheet(&ptmd_core::schema::GENERAL_SHEET_COLUMNS, general_row());
        let info = GeneralInformation::read(&table).unwrap();
        assert_eq!(info.partner_id, "UOB");
        assert_eq!(info.controls, 2);
        assert_eq!(info.replicates, 4);
        assert_eq!(info.blanks, 1);
        assert_eq!(info.timepoints, [0, 24, 48]);
        assert_eq!(info.end_date, "2024-01-10");
    }

    #[test]
    fn malformed_count_is_an_extraction_error() {
        let mut row = general_row();
        row[4] = Data::String("four".into());
        let table = sheet(&ptmd_core::schema::GENERAL_SHEET_COLUMNS, row);
        let err = GeneralInformation::read(&table).unwrap_err();
        assert!(matches!(err, AppError::Extraction(msg) if msg.contains("replicates")));
    }

    #[test]
    fn missing_column_is_named() {
        let headers = &ptmd_core::schema::GENERAL_SHEET_COLUMNS[..9];
        let mut row = general_row();
        row.pop();
        let err = GeneralInformation::read(&sheet(headers, row)).unwrap_err();
        assert!(matches!(err, AppError::Extraction(msg) if msg.contains("compound_vehicle")));
    }

    #[test]
    fn header_only_sheet_has_no_row() {
        let table = sheet(&["partner_id"], vec![Data::Empty]);
        assert!(matches!(
            GeneralInformation::read(&table),
            Err(AppError::Extraction(_))
        ));
    }
}
