use ptmd_core::models::{NewOrganism, Organism};
use ptmd_core::AppError;
use sqlx::{PgPool, Postgres};
use validator::Validate;

use super::is_unique_violation;

/// Repository for exposed organisms
#[derive(Clone)]
pub struct OrganismRepository {
    pool: PgPool,
}

impl OrganismRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, organism), fields(db.table = "organism", db.operation = "insert", name = %organism.ptox_biosystem_name))]
    pub async fn create(&self, organism: &NewOrganism) -> Result<Organism, AppError> {
        organism.validate()?;

        sqlx::query_as::<Postgres, Organism>(
            r#"
            INSERT INTO organism (ptox_biosystem_name, scientific_name, ptox_biosystem_code)
            VALUES ($1, $2, $3)
            RETURNING organism_id, ptox_biosystem_name, scientific_name, ptox_biosystem_code
            "#,
        )
        .bind(&organism.ptox_biosystem_name)
        .bind(&organism.scientific_name)
        .bind(&organism.ptox_biosystem_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidState(format!(
                    "Organism {} already exists",
                    organism.ptox_biosystem_name
                ))
            } else {
                e.into()
            }
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "organism", db.operation = "select", db.record_id = organism_id))]
    pub async fn get(&self, organism_id: i32) -> Result<Option<Organism>, AppError> {
        let organism = sqlx::query_as::<Postgres, Organism>(
            r#"
            SELECT organism_id, ptox_biosystem_name, scientific_name, ptox_biosystem_code
            FROM organism WHERE organism_id = $1
            "#,
        )
        .bind(organism_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organism)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organism", db.operation = "select"))]
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Organism>, AppError> {
        let organism = sqlx::query_as::<Postgres, Organism>(
            r#"
            SELECT organism_id, ptox_biosystem_name, scientific_name, ptox_biosystem_code
            FROM organism WHERE ptox_biosystem_name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organism)
    }
}
