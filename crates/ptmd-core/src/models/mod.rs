//! Data models for the application
//!
//! Persisted entities (files, chemicals, organisms, organisations, users, doses,
//! timepoints), their row and seed forms, and the transient extraction record.

mod chemical;
mod dose;
mod extraction;
mod file;
mod organisation;
mod organism;
mod user;
mod validation;

pub use chemical::*;
pub use dose::*;
pub use extraction::*;
pub use file::*;
pub use organisation::*;
pub use organism::*;
pub use user::*;
pub use validation::*;
