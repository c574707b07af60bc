use async_trait::async_trait;
use ptmd_core::mappings::{timepoint_code, timepoint_label};
use ptmd_core::models::{Timepoint, TIMEPOINT_UNIT};
use ptmd_core::{AppError, TimepointNormalizer};
use sqlx::{PgPool, Postgres};

/// Repository for sampling timepoints
#[derive(Clone)]
pub struct TimepointRepository {
    pool: PgPool,
}

impl TimepointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "timepoint", db.operation = "upsert"))]
    pub async fn upsert(&self, value: i32, label: &str) -> Result<Timepoint, AppError> {
        let row = sqlx::query_as::<Postgres, Timepoint>(
            r#"
            INSERT INTO timepoint (value, unit, label)
            VALUES ($1, $2, $3)
            ON CONFLICT (value, label) DO UPDATE SET unit = EXCLUDED.unit
            RETURNING timepoint_id, value, unit, label
            "#,
        )
        .bind(value)
        .bind(TIMEPOINT_UNIT)
        .bind(label)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl TimepointNormalizer for TimepointRepository {
    async fn normalize(&self, hours: &[i32]) -> Result<Vec<Timepoint>, AppError> {
        let mut timepoints = Vec::with_capacity(hours.len());
        for (index, value) in hours.iter().enumerate() {
            if *value < 0 {
                return Err(AppError::InvalidInput(format!(
                    "Timepoint hours must not be negative: {}",
                    value
                )));
            }
            let label = timepoint_label(index + 1);
            timepoint_code(&label)?;
            timepoints.push(self.upsert(*value, &label).await?);
        }
        Ok(timepoints)
    }
}
