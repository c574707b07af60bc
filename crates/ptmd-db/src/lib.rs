//! PTMD Database Library
//!
//! sqlx/Postgres repositories implementing the collaborator traits of
//! `ptmd-core`, the seed bootstrap and migration setup.

pub mod db;

pub use db::*;
