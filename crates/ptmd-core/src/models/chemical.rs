use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// A compound that can be administered to an organism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Chemical {
    pub chemical_id: i32,
    pub common_name: String,
    pub name_hash_id: Option<String>,
    pub formula: Option<String>,
    pub ptx_code: i32,
}

impl Chemical {
    /// Zero-padded three-digit PTX code, e.g. `001`.
    pub fn code(&self) -> String {
        format!("{:03}", self.ptx_code)
    }
}

/// Seed payload for a chemical.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewChemical {
    #[validate(length(min = 1, max = 255, message = "common_name must not be empty"))]
    pub common_name: String,
    #[serde(default)]
    pub name_hash_id: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[validate(range(min = 0, max = 999, message = "ptx_code must fit in three digits"))]
    pub ptx_code: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_zero_padded() {
        let chemical = Chemical {
            chemical_id: 1,
            common_name: "A NAME".into(),
            name_hash_id: None,
            formula: None,
            ptx_code: 1,
        };
        assert_eq!(chemical.code(), "001");
    }

    #[test]
    fn seed_rejects_out_of_range_code() {
        let seed = NewChemical {
            common_name: "test".into(),
            name_hash_id: None,
            formula: None,
            ptx_code: 1000,
        };
        assert!(seed.validate().is_err());
    }
}
