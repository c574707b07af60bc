//! Collaborator traits the services depend on.
//!
//! The Postgres repositories in `ptmd-db` implement these; tests substitute
//! in-memory versions.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::error::AppError;
use crate::lifecycle::{ReceptionPlan, ShipmentPlan};
use crate::models::{
    Chemical, Dose, File, FileFilter, NewFile, Organisation, Organism, Timepoint,
    ValidationStatus,
};

/// Persistence of file records and their associations.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Insert a file with `validated = No` together with its chemical, dose
    /// and timepoint associations, atomically.
    async fn insert(&self, file: NewFile) -> Result<File, AppError>;

    async fn get(&self, file_id: i32) -> Result<Option<File>, AppError>;

    /// Store a validation outcome only while the file is unshipped.
    /// Returns `false` when the guard no longer holds.
    async fn set_validation(&self, file_id: i32, status: ValidationStatus) -> Result<bool, AppError>;

    /// Persist a shipment only if the file is still validated and unshipped.
    /// Returns `false` when the guard no longer holds.
    async fn record_shipment(&self, plan: &ShipmentPlan) -> Result<bool, AppError>;

    /// Persist a reception only if the file is shipped and not yet received.
    /// Returns `false` when the guard no longer holds.
    async fn record_reception(&self, plan: &ReceptionPlan) -> Result<bool, AppError>;

    async fn update_batch(&self, file_id: i32, batch: &str) -> Result<(), AppError>;

    /// Whether `batch` is already used by a file of the organisation.
    async fn batch_in_use(&self, organisation_id: i32, batch: &str) -> Result<bool, AppError>;

    async fn delete(&self, file_id: i32) -> Result<(), AppError>;

    async fn search(&self, filter: &FileFilter) -> Result<Vec<File>, AppError>;
}

/// Resolves chemical common names. Fails with `NotFound` on the first unknown name.
#[async_trait]
pub trait ChemicalResolver: Send + Sync {
    async fn resolve(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Chemical>, AppError>;
}

/// Turns an hour list into timepoint rows, creating unseen ones. The n-th
/// hour value (1-based) is labelled `TPn`.
#[async_trait]
pub trait TimepointNormalizer: Send + Sync {
    async fn normalize(&self, hours: &[i32]) -> Result<Vec<Timepoint>, AppError>;
}

/// Turns dose levels into dose rows, creating unseen ones.
#[async_trait]
pub trait DoseNormalizer: Send + Sync {
    async fn normalize(&self, levels: &BTreeSet<String>) -> Result<Vec<Dose>, AppError>;
}

/// Lookups for the references a file carries: by name when registering a
/// spreadsheet, by id when presenting a stored file.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    async fn organisation(&self, organisation_id: i32) -> Result<Organisation, AppError>;

    async fn organism(&self, organism_id: i32) -> Result<Organism, AppError>;

    async fn vehicle(&self, chemical_id: i32) -> Result<Chemical, AppError>;

    async fn username(&self, user_id: i32) -> Result<String, AppError>;

    async fn organisation_by_name(&self, name: &str) -> Result<Organisation, AppError>;

    async fn organism_by_name(&self, name: &str) -> Result<Organism, AppError>;

    async fn vehicle_by_name(&self, name: &str) -> Result<Chemical, AppError>;
}
