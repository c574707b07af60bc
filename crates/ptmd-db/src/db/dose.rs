use std::collections::BTreeSet;

use async_trait::async_trait;
use ptmd_core::models::{Dose, NewDose};
use ptmd_core::{AppError, DoseNormalizer};
use sqlx::{PgPool, Postgres};

/// Repository for dose levels
#[derive(Clone)]
pub struct DoseRepository {
    pool: PgPool,
}

impl DoseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the dose unless an identical one exists, returning the stored row
    #[tracing::instrument(skip(self), fields(db.table = "dose", db.operation = "upsert"))]
    pub async fn upsert(&self, dose: &NewDose) -> Result<Dose, AppError> {
        let row = sqlx::query_as::<Postgres, Dose>(
            r#"
            INSERT INTO dose (value, unit, label)
            VALUES ($1, $2, $3)
            ON CONFLICT (value, unit, label) DO UPDATE SET value = EXCLUDED.value
            RETURNING dose_id, value, unit, label
            "#,
        )
        .bind(&dose.value)
        .bind(&dose.unit)
        .bind(&dose.label)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl DoseNormalizer for DoseRepository {
    async fn normalize(&self, levels: &BTreeSet<String>) -> Result<Vec<Dose>, AppError> {
        let mut doses = Vec::with_capacity(levels.len());
        for level in levels {
            let dose = NewDose::from_level(level)?;
            doses.push(self.upsert(&dose).await?);
        }
        Ok(doses)
    }
}
