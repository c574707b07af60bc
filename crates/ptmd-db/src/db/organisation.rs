use ptmd_core::models::{NewOrganisation, Organisation};
use ptmd_core::AppError;
use sqlx::{PgPool, Postgres};
use validator::Validate;

use super::is_unique_violation;

/// Repository for partner organisations
#[derive(Clone)]
pub struct OrganisationRepository {
    pool: PgPool,
}

impl OrganisationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, organisation), fields(db.table = "organisation", db.operation = "insert", name = %organisation.name))]
    pub async fn create(&self, organisation: &NewOrganisation) -> Result<Organisation, AppError> {
        organisation.validate()?;

        sqlx::query_as::<Postgres, Organisation>(
            r#"
            INSERT INTO organisation (name, gdrive_id, longname)
            VALUES ($1, $2, $3)
            RETURNING organisation_id, name, gdrive_id, longname
            "#,
        )
        .bind(&organisation.name)
        .bind(&organisation.gdrive_id)
        .bind(&organisation.longname)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidState(format!("Organisation {} already exists", organisation.name))
            } else {
                e.into()
            }
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "organisation", db.operation = "select", db.record_id = organisation_id))]
    pub async fn get(&self, organisation_id: i32) -> Result<Option<Organisation>, AppError> {
        let organisation = sqlx::query_as::<Postgres, Organisation>(
            "SELECT organisation_id, name, gdrive_id, longname FROM organisation WHERE organisation_id = $1",
        )
        .bind(organisation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organisation)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organisation", db.operation = "select"))]
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Organisation>, AppError> {
        let organisation = sqlx::query_as::<Postgres, Organisation>(
            "SELECT organisation_id, name, gdrive_id, longname FROM organisation WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organisation)
    }
}
