//! In-memory view of an exposure spreadsheet.
//!
//! Both sheets are read into [`SheetTable`]s: the first row is the header, the
//! remaining non-blank rows are data. Cells keep their calamine type; the
//! helpers below coerce them the way the sheets are filled in by hand (numbers
//! typed as text, dates typed as text or as Excel dates).

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use ptmd_core::schema::{EXPOSURE_SHEET_NAME, GENERAL_SHEET_NAME};
use ptmd_core::{AppError, DATE_FORMAT};

#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Vec<Data>>,
}

impl SheetTable {
    pub fn from_range(range: &Range<Data>) -> Self {
        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|row| {
                row.iter()
                    .map(|cell| cell_text(cell).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();
        let rows = rows
            .filter(|row| row.iter().any(|cell| cell_text(cell).is_some()))
            .map(|row| row.to_vec())
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Data> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Non-empty cells of a column, or `None` when the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<&Data>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(index))
                .filter(|cell| cell_text(cell).is_some())
                .collect(),
        )
    }
}

/// The two sheets of an exposure spreadsheet.
#[derive(Debug, Clone)]
pub struct ExposureWorkbook {
    pub general: SheetTable,
    pub exposure: SheetTable,
}

impl ExposureWorkbook {
    pub fn from_bytes(data: &[u8]) -> Result<Self, AppError> {
        let (general, exposure) = read_sheets(data)?;
        let missing = |name: &str| AppError::Extraction(format!("Missing sheet '{}'", name));
        Ok(Self {
            general: general.ok_or_else(|| missing(GENERAL_SHEET_NAME))?,
            exposure: exposure.ok_or_else(|| missing(EXPOSURE_SHEET_NAME))?,
        })
    }
}

/// Open a workbook and read both sheets, `None` for a sheet that is absent.
pub fn read_sheets(data: &[u8]) -> Result<(Option<SheetTable>, Option<SheetTable>), AppError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|e| AppError::Extraction(format!("Failed to open workbook: {}", e)))?;

    let general = read_sheet(&mut workbook, GENERAL_SHEET_NAME)?;
    let exposure = read_sheet(&mut workbook, EXPOSURE_SHEET_NAME)?;
    Ok((general, exposure))
}

fn read_sheet(
    workbook: &mut Xlsx<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<SheetTable>, AppError> {
    if !workbook.sheet_names().iter().any(|sheet| sheet == name) {
        return Ok(None);
    }
    let range = workbook
        .worksheet_range(name)
        .map_err(|e| AppError::Extraction(format!("Failed to read sheet '{}': {}", name, e)))?;
    Ok(Some(SheetTable::from_range(&range)))
}

/// Trimmed text of a cell; `None` for empty cells. Integral floats drop
/// their fraction so `24.0` reads as `24`.
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Integer value of a cell holding an integral number or numeric text.
pub fn cell_int(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `YYYY-MM-DD` text of a date cell, typed either as an Excel date or as text.
/// Text that is not a calendar date yields `None`.
pub fn cell_date(cell: &Data) -> Option<String> {
    let date = match cell {
        Data::DateTime(dt) => return dt.as_datetime().map(|d| d.format(DATE_FORMAT).to_string()),
        Data::DateTimeIso(s) => s.get(..10)?,
        Data::String(s) => {
            let s = s.trim();
            let rest = s.get(10..)?;
            if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T')) {
                return None;
            }
            s.get(..10)?
        }
        _ => return None,
    };
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// Hour offsets from a `timepoints` cell: a JSON list such as `[0,24,48]`, or
/// a single number.
pub fn cell_timepoints(cell: &Data) -> Result<Vec<i64>, String> {
    if let Data::Int(_) | Data::Float(_) = cell {
        return cell_int(cell)
            .map(|hours| vec![hours])
            .ok_or_else(|| "timepoints must be whole hours".to_string());
    }
    let text = cell_text(cell).ok_or_else(|| "timepoints is empty".to_string())?;
    if let Ok(hours) = text.parse::<i64>() {
        return Ok(vec![hours]);
    }
    serde_json::from_str::<Vec<i64>>(&text)
        .map_err(|e| format!("timepoints '{}' is not a JSON list of integers: {}", text, e))
}
