mod helpers;

use helpers::fixtures::{Cell, SpreadsheetBuilder};
use helpers::validator;
use ptmd_services::FileValidator;

fn errors_of(data: Vec<u8>) -> Vec<String> {
    let report = validator().validate(&data);
    assert_eq!(report.valid, report.errors.is_empty());
    report.errors
}

#[test]
fn well_formed_spreadsheet_is_valid() {
    let report = validator().validate(&SpreadsheetBuilder::new().build());
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
}

#[test]
fn validation_is_repeatable() {
    let data = SpreadsheetBuilder::new().general("exposure_batch", "A1").build();
    assert_eq!(validator().validate(&data), validator().validate(&data));
}

#[test]
fn every_problem_is_reported() {
    let errors = errors_of(
        SpreadsheetBuilder::new()
            .general("exposure_batch", "abc")
            .general("replicates", 0.0)
            .general("blanks", 50.0)
            .build(),
    );
    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors[0].contains("exposure_batch"));
    assert!(errors[1].contains("replicates"));
    assert!(errors[2].contains("blanks"));
}

#[test]
fn missing_sheets_are_reported_together() {
    let errors = errors_of(
        SpreadsheetBuilder::new()
            .without_general_sheet()
            .without_exposure_sheet()
            .build(),
    );
    assert_eq!(
        errors,
        [
            "Missing sheet 'General Information'",
            "Missing sheet 'Exposure information'"
        ]
    );
}

#[test]
fn general_sheet_needs_exactly_one_row() {
    let errors = errors_of(SpreadsheetBuilder::new().duplicate_general_row().build());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("exactly one data row"));

    let errors = errors_of(SpreadsheetBuilder::new().without_general_rows().build());
    assert!(errors[0].contains("no data row"));
}

#[test]
fn missing_general_column_is_named() {
    let errors = errors_of(
        SpreadsheetBuilder::new()
            .without_general_column("compound_vehicle")
            .build(),
    );
    assert!(errors
        .iter()
        .any(|e| e.contains("missing column 'compound_vehicle'")));
}

#[test]
fn end_before_start_is_reported() {
    let errors = errors_of(
        SpreadsheetBuilder::new()
            .general("exposure_batch_enddate", "2023-12-31")
            .build(),
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("before exposure_batch_startdate"));
}

#[test]
fn timepoint_list_is_bounded() {
    let errors = errors_of(
        SpreadsheetBuilder::new()
            .general("timepoints", "[0,1,2,3,4,5]")
            .build(),
    );
    assert!(errors[0].contains("at most 5 timepoints"));

    let errors = errors_of(SpreadsheetBuilder::new().general("timepoints", "[]").build());
    assert!(errors[0].contains("must not be empty"));

    let errors = errors_of(SpreadsheetBuilder::new().general("timepoints", "[-1]").build());
    assert!(errors[0].contains("negative"));
}

#[test]
fn unknown_dose_and_timepoint_codes_are_reported() {
    let errors = errors_of(
        SpreadsheetBuilder::new()
            .exposure(0, "dose", "BMD50")
            .exposure(1, "dose", Cell::Number(3.0))
            .exposure(2, "timepoint_level", "TP9")
            .build(),
    );
    assert_eq!(
        errors,
        [
            "Unknown dose code: BMD50",
            "Unknown dose code: 3",
            "Unknown timepoint code: TP9"
        ]
    );
}

#[test]
fn exposure_sheet_must_carry_sample_columns() {
    let errors = errors_of(
        SpreadsheetBuilder::new()
            .without_exposure_column("ptx_id")
            .build(),
    );
    assert_eq!(
        errors,
        ["Exposure information: missing column 'ptx_id'"]
    );
}

#[test]
fn allow_lists_apply_when_configured() {
    let data = SpreadsheetBuilder::new().general("compound_vehicle", "Water").build();
    assert!(validator().validate(&data).valid);

    let strict = validator()
        .with_allowed_partners(vec!["UOB".to_string()])
        .with_allowed_vehicles(vec!["DMSO".to_string()]);
    let report = strict.validate(&data);
    assert_eq!(report.errors, ["compound_vehicle 'Water' is not allowed"]);
}
