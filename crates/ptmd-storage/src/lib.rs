//! PTMD Storage Library
//!
//! Drive abstraction for the spreadsheets backing file records, with a Google
//! Drive backend and a local filesystem backend.
//!
//! # Storage keys
//!
//! A key is whatever the backend uses to address a file: the Drive file id for
//! Google Drive, a relative `{folder}/{filename}` path for the local backend.
//! Local keys must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-gdrive")]
pub mod gdrive;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-gdrive")]
pub use gdrive::GoogleDriveStorage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use ptmd_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
