use async_trait::async_trait;
use ptmd_core::models::{
    Chemical, Dose, File, FileFilter, FileRow, NewFile, Timepoint, ValidationStatus,
};
use ptmd_core::{AppError, FileStore, ReceptionPlan, ShipmentPlan};
use sqlx::{PgPool, Postgres};

use super::is_unique_violation;
use super::transaction::TransactionGuard;

const FILE_COLUMNS: &str = "file_id, gdrive_id, name, batch, validated, replicates, controls, blanks, \
     shipped, received, start_date, end_date, ship_date, receive_date, \
     organisation_id, author_id, organism_id, vehicle_id";

/// Repository for exposure batch files and their associations
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach chemicals, doses and timepoints to a bare row
    async fn hydrate(&self, row: FileRow) -> Result<File, AppError> {
        let chemicals = sqlx::query_as::<Postgres, Chemical>(
            r#"
            SELECT c.chemical_id, c.common_name, c.name_hash_id, c.formula, c.ptx_code
            FROM chemical c
            JOIN files_chemicals fc ON fc.chemical_id = c.chemical_id
            WHERE fc.file_id = $1
            ORDER BY c.common_name
            "#,
        )
        .bind(row.file_id)
        .fetch_all(&self.pool)
        .await?;

        let doses = sqlx::query_as::<Postgres, Dose>(
            r#"
            SELECT d.dose_id, d.value, d.unit, d.label
            FROM dose d
            JOIN files_doses fd ON fd.dose_id = d.dose_id
            WHERE fd.file_id = $1
            ORDER BY d.label
            "#,
        )
        .bind(row.file_id)
        .fetch_all(&self.pool)
        .await?;

        let timepoints = sqlx::query_as::<Postgres, Timepoint>(
            r#"
            SELECT t.timepoint_id, t.value, t.unit, t.label
            FROM timepoint t
            JOIN files_timepoints ft ON ft.timepoint_id = t.timepoint_id
            WHERE ft.file_id = $1
            ORDER BY t.label
            "#,
        )
        .bind(row.file_id)
        .fetch_all(&self.pool)
        .await?;

        row.into_file(chemicals, doses, timepoints)
    }
}

#[async_trait]
impl FileStore for FileRepository {
    #[tracing::instrument(skip(self, file), fields(db.table = "file", db.operation = "insert", batch = %file.batch))]
    async fn insert(&self, file: NewFile) -> Result<File, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "file insert").await?;

        let row = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            INSERT INTO file (gdrive_id, name, batch, replicates, controls, blanks,
                              start_date, end_date, organisation_id, author_id, organism_id, vehicle_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(&file.gdrive_id)
        .bind(&file.name)
        .bind(&file.batch)
        .bind(file.replicates)
        .bind(file.controls)
        .bind(file.blanks)
        .bind(file.start_date)
        .bind(file.end_date)
        .bind(file.organisation_id)
        .bind(file.author_id)
        .bind(file.organism_id)
        .bind(file.vehicle_id)
        .fetch_one(tx.conn()?)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidState(format!(
                    "Batch {} or drive file {} is already registered",
                    file.batch, file.gdrive_id
                ))
            } else {
                e.into()
            }
        })?;

        let chemical_ids: Vec<i32> = file.chemicals.iter().map(|c| c.chemical_id).collect();
        sqlx::query(
            "INSERT INTO files_chemicals (file_id, chemical_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(row.file_id)
        .bind(&chemical_ids)
        .execute(tx.conn()?)
        .await?;

        let dose_ids: Vec<i32> = file.doses.iter().map(|d| d.dose_id).collect();
        sqlx::query(
            "INSERT INTO files_doses (file_id, dose_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(row.file_id)
        .bind(&dose_ids)
        .execute(tx.conn()?)
        .await?;

        let timepoint_ids: Vec<i32> = file.timepoints.iter().map(|t| t.timepoint_id).collect();
        sqlx::query(
            "INSERT INTO files_timepoints (file_id, timepoint_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(row.file_id)
        .bind(&timepoint_ids)
        .execute(tx.conn()?)
        .await?;

        tx.commit().await?;

        tracing::info!(file_id = row.file_id, "File registered");
        row.into_file(file.chemicals, file.doses, file.timepoints)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "select", db.record_id = file_id))]
    async fn get(&self, file_id: i32) -> Result<Option<File>, AppError> {
        let row = sqlx::query_as::<Postgres, FileRow>(&format!(
            "SELECT {} FROM file WHERE file_id = $1",
            FILE_COLUMNS
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "update", db.record_id = file_id))]
    async fn set_validation(&self, file_id: i32, status: ValidationStatus) -> Result<bool, AppError> {
        let updated = sqlx::query_scalar::<Postgres, i32>(
            r#"
            UPDATE file
            SET validated = $2
            WHERE file_id = $1 AND shipped = FALSE
            RETURNING file_id
            "#,
        )
        .bind(file_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated.is_some())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "update", db.record_id = plan.file_id))]
    async fn record_shipment(&self, plan: &ShipmentPlan) -> Result<bool, AppError> {
        let updated = sqlx::query_scalar::<Postgres, i32>(
            r#"
            UPDATE file
            SET shipped = TRUE, ship_date = $2
            WHERE file_id = $1 AND shipped = FALSE AND validated = 'success'
            RETURNING file_id
            "#,
        )
        .bind(plan.file_id)
        .bind(plan.ship_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated.is_some())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "update", db.record_id = plan.file_id))]
    async fn record_reception(&self, plan: &ReceptionPlan) -> Result<bool, AppError> {
        let updated = sqlx::query_scalar::<Postgres, i32>(
            r#"
            UPDATE file
            SET received = TRUE, receive_date = $2
            WHERE file_id = $1 AND shipped = TRUE AND received = FALSE AND ship_date <= $2
            RETURNING file_id
            "#,
        )
        .bind(plan.file_id)
        .bind(plan.receive_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated.is_some())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "update", db.record_id = file_id))]
    async fn update_batch(&self, file_id: i32, batch: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE file SET batch = $2 WHERE file_id = $1")
            .bind(file_id)
            .bind(batch)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::InvalidState(format!("Batch {} is already used", batch))
                } else {
                    e.into()
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("File {}", file_id)));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "select"))]
    async fn batch_in_use(&self, organisation_id: i32, batch: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM file WHERE organisation_id = $1 AND batch = $2)",
        )
        .bind(organisation_id)
        .bind(batch)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "delete", db.record_id = file_id))]
    async fn delete(&self, file_id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM file WHERE file_id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("File {}", file_id)));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file", db.operation = "select"))]
    async fn search(&self, filter: &FileFilter) -> Result<Vec<File>, AppError> {
        let rows = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            SELECT {} FROM file
            WHERE ($1::int IS NULL OR organisation_id = $1)
              AND ($2::int IS NULL OR author_id = $2)
              AND ($3::text IS NULL OR batch = $3)
              AND ($4::text IS NULL OR validated = $4)
              AND ($5::bool IS NULL OR shipped = $5)
              AND ($6::bool IS NULL OR received = $6)
            ORDER BY file_id
            "#,
            FILE_COLUMNS
        ))
        .bind(filter.organisation_id)
        .bind(filter.author_id)
        .bind(&filter.batch)
        .bind(filter.validated.map(|v| v.as_str()))
        .bind(filter.shipped)
        .bind(filter.received)
        .fetch_all(&self.pool)
        .await?;

        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            files.push(self.hydrate(row).await?);
        }
        Ok(files)
    }
}
