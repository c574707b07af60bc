//! Database repositories for data access layer
//!
//! One repository per entity. The file, chemical, dose, timepoint and reference
//! repositories implement the collaborator traits of `ptmd_core::repository`.

pub mod boot;
pub mod chemical;
pub mod dose;
pub mod file;
pub mod organisation;
pub mod organism;
pub mod reference;
pub mod setup;
pub mod timepoint;
pub mod transaction;
pub mod user;

pub use boot::{BootReport, Bootstrapper, CreationOutcome, CreationReport, SeedData};
pub use chemical::ChemicalRepository;
pub use dose::DoseRepository;
pub use file::FileRepository;
pub use organisation::OrganisationRepository;
pub use organism::OrganismRepository;
pub use reference::ReferenceRepository;
pub use setup::{run_migrations, setup_database};
pub use timepoint::TimepointRepository;
pub use transaction::TransactionGuard;
pub use user::UserRepository;

/// Whether the error is a Postgres unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
