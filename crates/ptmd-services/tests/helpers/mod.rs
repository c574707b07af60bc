//! Test helpers: in-memory collaborators and spreadsheet fixtures.
//!
//! Run with `cargo test -p ptmd-services`.

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use std::sync::Arc;

use chrono::NaiveDateTime;
use ptmd_core::lifecycle::parse_date;
use ptmd_core::models::{Caller, Role};
use ptmd_services::{FileService, SpreadsheetExtractor, SpreadsheetValidator};
use ptmd_storage::Storage;

use fakes::{FakeChemicals, FakeDoses, FakeReferences, FakeTimepoints, InMemoryFileStore};

pub const AUTHOR: Caller = Caller {
    user_id: 1,
    role: Role::User,
};
pub const STRANGER: Caller = Caller {
    user_id: 2,
    role: Role::User,
};
pub const ADMIN: Caller = Caller {
    user_id: 3,
    role: Role::Admin,
};

pub fn day(raw: &str) -> NaiveDateTime {
    parse_date(raw).unwrap()
}

pub fn extractor() -> SpreadsheetExtractor {
    SpreadsheetExtractor::new(
        Arc::new(FakeChemicals::default()),
        Arc::new(FakeTimepoints),
        Arc::new(FakeDoses),
    )
}

pub fn validator() -> SpreadsheetValidator {
    SpreadsheetValidator::new(fixtures::column_model(), 1, 20).unwrap()
}

/// A service over the given store and drive whose clock reads 2024-01-20.
pub fn service(store: Arc<InMemoryFileStore>, drive: Arc<dyn Storage>) -> FileService {
    service_with_validator(store, drive, validator())
}

pub fn service_with_validator(
    store: Arc<InMemoryFileStore>,
    drive: Arc<dyn Storage>,
    validator: SpreadsheetValidator,
) -> FileService {
    FileService::new(
        store,
        Arc::new(FakeReferences),
        drive,
        Arc::new(extractor()),
        Arc::new(validator),
    )
    .with_clock(|| day("2024-01-20"))
}
