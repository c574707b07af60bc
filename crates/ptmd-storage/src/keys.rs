//! Shared key handling for storage backends.
//!
//! Local keys are `{folder}/{filename}`, or `files/{filename}` without a folder.
//! Keys must not contain `..` or a leading `/`.

use crate::traits::{StorageError, StorageResult};

const DEFAULT_FOLDER: &str = "files";

pub fn generate_storage_key(folder: Option<&str>, filename: &str) -> String {
    let folder = folder
        .map(|f| f.trim_matches('/'))
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FOLDER);
    format!("{}/{}", folder, filename)
}

pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key '{}' contains invalid characters",
            storage_key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_default_to_files_folder() {
        assert_eq!(generate_storage_key(None, "a.xlsx"), "files/a.xlsx");
        assert_eq!(generate_storage_key(Some(""), "a.xlsx"), "files/a.xlsx");
        assert_eq!(generate_storage_key(Some("/UOB/"), "a.xlsx"), "UOB/a.xlsx");
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("UOB/a.xlsx").is_ok());
    }
}
