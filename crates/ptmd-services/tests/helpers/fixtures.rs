//! Exposure workbooks built in memory with rust_xlsxwriter.

use ptmd_core::schema::{
    ColumnModel, SheetSchema, COMPOUND_NAME_LABEL, DOSE_LABEL, EXPOSURE_SHEET_NAME,
    GENERAL_SHEET_COLUMNS, GENERAL_SHEET_NAME, TIMEPOINT_LABEL,
};
use rust_xlsxwriter::Workbook;

#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

pub fn column_model() -> ColumnModel {
    ColumnModel::from_schema(&SheetSchema::embedded().unwrap()).unwrap()
}

/// A well-formed exposure spreadsheet: batch `AA` of partner `UOB`, run from
/// 2024-01-01 to 2024-01-10 at `[0,24,48]`, exposing `X`, `X` and `Y`.
pub struct SpreadsheetBuilder {
    general_headers: Vec<String>,
    general_rows: Vec<Vec<Cell>>,
    exposure_headers: Vec<String>,
    exposure_rows: Vec<Vec<(String, Cell)>>,
    with_general: bool,
    with_exposure: bool,
}

impl Default for SpreadsheetBuilder {
    fn default() -> Self {
        let general_row: Vec<Cell> = vec![
            "UOB".into(),
            "zebrafish".into(),
            "AA".into(),
            2.0.into(),
            4.0.into(),
            1.0.into(),
            "2024-01-01".into(),
            "2024-01-10".into(),
            "[0,24,48]".into(),
            "DMSO".into(),
        ];
        let exposure_row = |compound: &str, dose: Cell, timepoint: &str| {
            vec![
                (COMPOUND_NAME_LABEL.to_string(), Cell::from(compound)),
                (DOSE_LABEL.to_string(), dose),
                (TIMEPOINT_LABEL.to_string(), Cell::from(timepoint)),
            ]
        };

        Self {
            general_headers: GENERAL_SHEET_COLUMNS.iter().map(|c| c.to_string()).collect(),
            general_rows: vec![general_row],
            exposure_headers: column_model().sample_sheet_columns(),
            exposure_rows: vec![
                exposure_row("X", "BMD10".into(), "TP1"),
                exposure_row("X", 0.0.into(), "TP2"),
                exposure_row("Y", "BMD25".into(), "TP3"),
            ],
            with_general: true,
            with_exposure: true,
        }
    }
}

impl SpreadsheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite one general-sheet value of the first data row.
    pub fn general(mut self, header: &str, value: impl Into<Cell>) -> Self {
        if let Some(index) = self.general_headers.iter().position(|h| h == header) {
            self.general_rows[0][index] = value.into();
        }
        self
    }

    pub fn without_general_column(mut self, header: &str) -> Self {
        if let Some(index) = self.general_headers.iter().position(|h| h == header) {
            self.general_headers.remove(index);
            for row in &mut self.general_rows {
                row.remove(index);
            }
        }
        self
    }

    pub fn duplicate_general_row(mut self) -> Self {
        let row = self.general_rows[0].clone();
        self.general_rows.push(row);
        self
    }

    pub fn without_general_rows(mut self) -> Self {
        self.general_rows.clear();
        self
    }

    pub fn without_exposure_column(mut self, header: &str) -> Self {
        self.exposure_headers.retain(|h| h != header);
        self
    }

    /// Overwrite one exposure-sheet value.
    pub fn exposure(mut self, row: usize, header: &str, value: impl Into<Cell>) -> Self {
        let value = value.into();
        if let Some(cells) = self.exposure_rows.get_mut(row) {
            match cells.iter_mut().find(|(h, _)| h == header) {
                Some(cell) => cell.1 = value,
                None => cells.push((header.to_string(), value)),
            }
        }
        self
    }

    pub fn without_general_sheet(mut self) -> Self {
        self.with_general = false;
        self
    }

    pub fn without_exposure_sheet(mut self) -> Self {
        self.with_exposure = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut workbook = Workbook::new();

        if self.with_general {
            let sheet = workbook.add_worksheet();
            sheet.set_name(GENERAL_SHEET_NAME).unwrap();
            for (col, header) in self.general_headers.iter().enumerate() {
                sheet.write_string(0, col as u16, header).unwrap();
            }
            for (row, cells) in self.general_rows.iter().enumerate() {
                for (col, cell) in cells.iter().enumerate() {
                    write_cell(sheet, row as u32 + 1, col as u16, cell);
                }
            }
        }

        if self.with_exposure {
            let sheet = workbook.add_worksheet();
            sheet.set_name(EXPOSURE_SHEET_NAME).unwrap();
            for (col, header) in self.exposure_headers.iter().enumerate() {
                sheet.write_string(0, col as u16, header).unwrap();
            }
            for (row, cells) in self.exposure_rows.iter().enumerate() {
                for (header, cell) in cells {
                    if let Some(col) = self.exposure_headers.iter().position(|h| h == header) {
                        write_cell(sheet, row as u32 + 1, col as u16, cell);
                    }
                }
            }
        }

        if !self.with_general && !self.with_exposure {
            workbook.add_worksheet().set_name("Notes").unwrap();
        }

        workbook.save_to_buffer().unwrap()
    }
}

fn write_cell(sheet: &mut rust_xlsxwriter::Worksheet, row: u32, col: u16, cell: &Cell) {
    match cell {
        Cell::Text(text) => {
            sheet.write_string(row, col, text).unwrap();
        }
        Cell::Number(number) => {
            sheet.write_number(row, col, *number).unwrap();
        }
        Cell::Empty => {}
    }
}
