//! Spreadsheet validation
//!
//! Unlike extraction, validation does not stop at the first problem: every
//! check runs and each failure adds one line to the [`ValidationReport`].

use calamine::Data;
use chrono::NaiveDate;
use ptmd_core::mappings::{self, DoseKey};
use ptmd_core::models::ValidationReport;
use ptmd_core::schema::{
    ColumnModel, DOSE_LABEL, EXPOSURE_SHEET_NAME, GENERAL_SHEET_COLUMNS, GENERAL_SHEET_NAME,
    TIMEPOINT_LABEL,
};
use ptmd_core::{AppError, Config, DATE_FORMAT};
use regex::Regex;

use crate::workbook::{cell_date, cell_int, cell_text, cell_timepoints, read_sheets, SheetTable};

const MAX_TIMEPOINTS: usize = 5;
const BATCH_PATTERN: &str = "^[A-Z]{2}$";

/// Checks an exposure spreadsheet before it can be shipped.
pub trait FileValidator: Send + Sync {
    fn validate(&self, data: &[u8]) -> ValidationReport;
}

pub struct SpreadsheetValidator {
    column_model: ColumnModel,
    blanks_min: i32,
    blanks_max: i32,
    allowed_partners: Vec<String>,
    allowed_vehicles: Vec<String>,
    batch_pattern: Regex,
}

impl SpreadsheetValidator {
    pub fn new(column_model: ColumnModel, blanks_min: i32, blanks_max: i32) -> Result<Self, AppError> {
        let batch_pattern = Regex::new(BATCH_PATTERN).map_err(|e| {
            AppError::Configuration(format!("Failed to compile batch pattern: {}", e))
        })?;
        Ok(Self {
            column_model,
            blanks_min,
            blanks_max,
            allowed_partners: Vec::new(),
            allowed_vehicles: Vec::new(),
            batch_pattern,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(
            Self::new(config.column_model.clone(), config.blanks_min, config.blanks_max)?
                .with_allowed_partners(config.allowed_partners.clone())
                .with_allowed_vehicles(config.allowed_vehicles.clone()),
        )
    }

    /// Empty accepts any partner.
    pub fn with_allowed_partners(mut self, partners: Vec<String>) -> Self {
        self.allowed_partners = partners;
        self
    }

    /// Empty accepts any vehicle.
    pub fn with_allowed_vehicles(mut self, vehicles: Vec<String>) -> Self {
        self.allowed_vehicles = vehicles;
        self
    }

    fn check_general(&self, sheet: &SheetTable, errors: &mut Vec<String>) {
        let headers = sheet.headers();
        if headers != GENERAL_SHEET_COLUMNS {
            for column in GENERAL_SHEET_COLUMNS {
                if !headers.iter().any(|h| h == column) {
                    errors.push(format!("{}: missing column '{}'", GENERAL_SHEET_NAME, column));
                }
            }
            for header in headers {
                if !header.is_empty() && !GENERAL_SHEET_COLUMNS.contains(&header.as_str()) {
                    errors.push(format!("{}: unexpected column '{}'", GENERAL_SHEET_NAME, header));
                }
            }
        }

        match sheet.row_count() {
            1 => {}
            0 => {
                errors.push(format!("{}: no data row", GENERAL_SHEET_NAME));
                return;
            }
            n => errors.push(format!(
                "{}: expected exactly one data row, found {}",
                GENERAL_SHEET_NAME, n
            )),
        }

        let cell = |column: &str| sheet.cell(0, column).filter(|c| cell_text(c).is_some());

        match cell("exposure_batch").and_then(cell_text) {
            Some(batch) if self.batch_pattern.is_match(&batch) => {}
            Some(batch) => errors.push(format!(
                "exposure_batch '{}' must be two uppercase letters",
                batch
            )),
            None => errors.push("exposure_batch is missing".to_string()),
        }

        for column in ["replicates", "control"] {
            match cell(column).and_then(cell_int) {
                Some(n) if n >= 1 => {}
                Some(n) => errors.push(format!("{} must be at least 1, got {}", column, n)),
                None => errors.push(format!("{} must be a whole number", column)),
            }
        }

        match cell("blanks").and_then(cell_int) {
            Some(n) if (self.blanks_min as i64..=self.blanks_max as i64).contains(&n) => {}
            Some(n) => errors.push(format!(
                "blanks must be between {} and {}, got {}",
                self.blanks_min, self.blanks_max, n
            )),
            None => errors.push("blanks must be a whole number".to_string()),
        }

        let start = parsed_date(cell("exposure_batch_startdate"), "exposure_batch_startdate", errors);
        let end = parsed_date(cell("exposure_batch_enddate"), "exposure_batch_enddate", errors);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.push(format!(
                    "exposure_batch_enddate {} is before exposure_batch_startdate {}",
                    end, start
                ));
            }
        }

        match cell("timepoints").map(cell_timepoints) {
            Some(Ok(hours)) => {
                if hours.is_empty() {
                    errors.push("timepoints must not be empty".to_string());
                }
                if hours.len() > MAX_TIMEPOINTS {
                    errors.push(format!(
                        "at most {} timepoints are allowed, got {}",
                        MAX_TIMEPOINTS,
                        hours.len()
                    ));
                }
                if let Some(negative) = hours.iter().find(|h| **h < 0) {
                    errors.push(format!("timepoint {} must not be negative", negative));
                }
            }
            Some(Err(message)) => errors.push(message),
            None => errors.push("timepoints is missing".to_string()),
        }

        let partner = cell("partner_id").and_then(cell_text);
        check_allowed("partner_id", partner, &self.allowed_partners, errors);
        let vehicle = cell("compound_vehicle").and_then(cell_text);
        check_allowed("compound_vehicle", vehicle, &self.allowed_vehicles, errors);
    }

    fn check_exposure(&self, sheet: &SheetTable, errors: &mut Vec<String>) {
        for column in self.column_model.sample_sheet_columns() {
            if sheet.column_index(&column).is_none() {
                errors.push(format!("{}: missing column '{}'", EXPOSURE_SHEET_NAME, column));
            }
        }

        if let Some(cells) = sheet.column(DOSE_LABEL) {
            for cell in cells {
                let key = match cell {
                    Data::Float(f) => DoseKey::Number(*f),
                    Data::Int(i) => DoseKey::Number(*i as f64),
                    _ => {
                        let text = cell_text(cell).unwrap_or_default();
                        if let Err(err) = mappings::dose_code(DoseKey::Text(&text)) {
                            errors.push(err.to_string());
                        }
                        continue;
                    }
                };
                if let Err(err) = mappings::dose_code(key) {
                    errors.push(err.to_string());
                }
            }
        }

        if let Some(cells) = sheet.column(TIMEPOINT_LABEL) {
            for label in cells.into_iter().filter_map(cell_text) {
                if let Err(err) = mappings::timepoint_code(&label) {
                    errors.push(err.to_string());
                }
            }
        }
    }
}

fn parsed_date(cell: Option<&Data>, column: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let parsed = cell
        .and_then(cell_date)
        .and_then(|raw| NaiveDate::parse_from_str(&raw, DATE_FORMAT).ok());
    if parsed.is_none() {
        errors.push(format!("{} must be a YYYY-MM-DD date", column));
    }
    parsed
}

fn check_allowed(column: &str, value: Option<String>, allowed: &[String], errors: &mut Vec<String>) {
    match value {
        None => errors.push(format!("{} is missing", column)),
        Some(value) if !allowed.is_empty() && !allowed.contains(&value) => {
            errors.push(format!("{} '{}' is not allowed", column, value))
        }
        Some(_) => {}
    }
}

impl FileValidator for SpreadsheetValidator {
    fn validate(&self, data: &[u8]) -> ValidationReport {
        let mut errors = Vec::new();

        match read_sheets(data) {
            Ok((general, exposure)) => {
                match general {
                    Some(sheet) => self.check_general(&sheet, &mut errors),
                    None => errors.push(format!("Missing sheet '{}'", GENERAL_SHEET_NAME)),
                }
                match exposure {
                    Some(sheet) => self.check_exposure(&sheet, &mut errors),
                    None => errors.push(format!("Missing sheet '{}'", EXPOSURE_SHEET_NAME)),
                }
            }
            Err(err) => errors.push(err.to_string()),
        }

        let report = ValidationReport::from_errors(errors);
        tracing::debug!(valid = report.valid, errors = report.errors.len(), "Spreadsheet validated");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptmd_core::schema::SheetSchema;

    fn validator() -> SpreadsheetValidator {
        let model = ColumnModel::from_schema(&SheetSchema::embedded().unwrap()).unwrap();
        SpreadsheetValidator::new(model, 1, 3).unwrap()
    }

    #[test]
    fn garbage_bytes_give_an_invalid_report() {
        let report = validator().validate(b"not a workbook");
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn allow_list_rejects_unknown_values() {
        let mut errors = Vec::new();
        let allowed = vec!["UOB".to_string()];
        check_allowed("partner_id", Some("KIT".into()), &allowed, &mut errors);
        check_allowed("partner_id", Some("UOB".into()), &allowed, &mut errors);
        check_allowed("partner_id", Some("ANY".into()), &[], &mut errors);
        assert_eq!(errors, ["partner_id 'KIT' is not allowed"]);
    }

    #[test]
    fn unparseable_dates_are_reported() {
        let mut errors = Vec::new();
        let cell = Data::String("2024-13-01".into());
        assert_eq!(parsed_date(Some(&cell), "exposure_batch_startdate", &mut errors), None);
        assert_eq!(errors.len(), 1);
    }
}
