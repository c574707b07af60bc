//! PTMD Services
//!
//! Spreadsheet reading, extraction and validation, and the file service that
//! drives the lifecycle across the store, the drive and the validator.

pub mod extractor;
pub mod file_service;
pub mod validator;
pub mod workbook;

pub use extractor::{GeneralInformation, SpreadsheetExtractor};
pub use file_service::FileService;
pub use validator::{FileValidator, SpreadsheetValidator};
pub use workbook::{ExposureWorkbook, SheetTable};
