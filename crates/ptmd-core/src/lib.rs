//! PTMD Core Library
//!
//! Domain models, code mappings, the sheet column model, the file lifecycle
//! state machine, error types, configuration and the collaborator traits shared
//! by every PTMD crate.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mappings;
pub mod models;
pub mod repository;
pub mod schema;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use lifecycle::{LifecycleState, ReceptionPlan, ShipmentPlan, DATE_FORMAT};
pub use repository::{ChemicalResolver, DoseNormalizer, FileStore, ReferenceLookup, TimepointNormalizer};
pub use schema::{ColumnModel, SheetSchema};
pub use storage_types::StorageBackend;
