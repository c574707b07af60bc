use async_trait::async_trait;
use ptmd_core::models::{Chemical, Organisation, Organism};
use ptmd_core::{AppError, ReferenceLookup};
use sqlx::PgPool;

use super::{ChemicalRepository, OrganisationRepository, OrganismRepository, UserRepository};

/// Lookups over the organisation, organism, chemical and user tables
#[derive(Clone)]
pub struct ReferenceRepository {
    organisations: OrganisationRepository,
    organisms: OrganismRepository,
    chemicals: ChemicalRepository,
    users: UserRepository,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            organisations: OrganisationRepository::new(pool.clone()),
            organisms: OrganismRepository::new(pool.clone()),
            chemicals: ChemicalRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }
}

#[async_trait]
impl ReferenceLookup for ReferenceRepository {
    async fn organisation(&self, organisation_id: i32) -> Result<Organisation, AppError> {
        self.organisations
            .get(organisation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organisation {}", organisation_id)))
    }

    async fn organisation_by_name(&self, name: &str) -> Result<Organisation, AppError> {
        self.organisations
            .get_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organisation '{}'", name)))
    }

    async fn organism(&self, organism_id: i32) -> Result<Organism, AppError> {
        self.organisms
            .get(organism_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organism {}", organism_id)))
    }

    async fn vehicle(&self, chemical_id: i32) -> Result<Chemical, AppError> {
        self.chemicals
            .get(chemical_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {}", chemical_id)))
    }

    async fn username(&self, user_id: i32) -> Result<String, AppError> {
        self.users
            .get(user_id)
            .await?
            .map(|user| user.username)
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
    }

    async fn organism_by_name(&self, name: &str) -> Result<Organism, AppError> {
        self.organisms
            .get_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organism '{}'", name)))
    }

    async fn vehicle_by_name(&self, name: &str) -> Result<Chemical, AppError> {
        self.chemicals
            .get_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle '{}'", name)))
    }
}
