#[cfg(feature = "storage-gdrive")]
use crate::GoogleDriveStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use ptmd_core::Config;
use std::sync::Arc;

/// Create the drive backend selected by configuration
///
/// Called once by the composition root; the returned handle is shared by
/// every service for the lifetime of the process.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-gdrive")]
        StorageBackend::GoogleDrive => {
            let token = config.gdrive_access_token.clone().ok_or_else(|| {
                StorageError::ConfigError("GDRIVE_ACCESS_TOKEN not configured".to_string())
            })?;

            let storage = GoogleDriveStorage::new(config.gdrive_api_base.clone(), token)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-gdrive"))]
        StorageBackend::GoogleDrive => Err(StorageError::ConfigError(
            "Google Drive backend not available (storage-gdrive feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
