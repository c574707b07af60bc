//! Storage abstraction trait
//!
//! This module defines the Storage trait that every drive backend implements.

use crate::StorageBackend;
use async_trait::async_trait;
use ptmd_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    /// The credentials in use may not modify this resource.
    #[error("Permission denied on {0}")]
    PermissionDenied(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Drive file {}", key)),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Drive abstraction
///
/// Files live under a folder (an organisation's drive folder, or the backend's
/// root when `None`). The returned key is the backend's identifier for the file
/// and is what `File::gdrive_id` stores.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a file and return its storage key
    async fn upload(
        &self,
        folder: Option<&str>,
        filename: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Download a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key
    ///
    /// Fails with [`StorageError::PermissionDenied`] when the file is not
    /// owned by the credentials in use.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Make the file read-only for everyone but its owner
    async fn lock(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
