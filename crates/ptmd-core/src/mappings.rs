//! Dose and timepoint code tables.
//!
//! Both tables are closed: a key outside the table is an error, never a default.

use crate::error::AppError;

/// A dose level as it appears in a spreadsheet cell: either a number or text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DoseKey<'a> {
    Number(f64),
    Text(&'a str),
}

const DOSE_MAPPING: [(&str, char); 4] = [("0", 'Z'), ("BMD10", 'L'), ("BMD25", 'M'), ("10mg/L", 'H')];

const TIMEPOINT_MAPPING: [(&str, char); 6] = [
    ("TP0", 'S'),
    ("TP1", 'A'),
    ("TP2", 'B'),
    ("TP3", 'C'),
    ("TP4", 'D'),
    ("TP5", 'E'),
];

/// Every textual dose level the mapping accepts.
pub fn dose_levels() -> impl Iterator<Item = &'static str> {
    DOSE_MAPPING.iter().map(|(key, _)| *key)
}

/// Every timepoint label the mapping accepts.
pub fn timepoint_labels() -> impl Iterator<Item = &'static str> {
    TIMEPOINT_MAPPING.iter().map(|(key, _)| *key)
}

pub fn dose_code(key: DoseKey<'_>) -> Result<char, AppError> {
    match key {
        DoseKey::Number(n) if n == 0.0 => Ok('Z'),
        DoseKey::Number(n) => Err(AppError::UnknownCode {
            kind: "dose",
            key: n.to_string(),
        }),
        DoseKey::Text(text) => DOSE_MAPPING
            .iter()
            .find(|(level, _)| *level == text)
            .map(|(_, code)| *code)
            .ok_or_else(|| AppError::UnknownCode {
                kind: "dose",
                key: text.to_string(),
            }),
    }
}

pub fn timepoint_code(label: &str) -> Result<char, AppError> {
    TIMEPOINT_MAPPING
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, code)| *code)
        .ok_or_else(|| AppError::UnknownCode {
            kind: "timepoint",
            key: label.to_string(),
        })
}

/// Label of the timepoint at 1-based `position` in a file's hour list.
pub fn timepoint_label(position: usize) -> String {
    format!("TP{}", position)
}

/// Split a dose level into its value and unit: `10mg/L` gives `("10", "mg/L")`,
/// named levels such as `BMD10` keep the whole key as value with no unit.
pub fn split_dose_level(level: &str) -> (String, String) {
    let digits = level
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    if digits == 0 {
        return (level.to_string(), String::new());
    }
    let (value, unit) = level.split_at(digits);
    (value.to_string(), unit.to_string())
}
