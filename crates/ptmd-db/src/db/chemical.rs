use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use ptmd_core::models::{Chemical, NewChemical};
use ptmd_core::{AppError, ChemicalResolver};
use sqlx::{PgPool, Postgres};
use validator::Validate;

use super::is_unique_violation;

const CHEMICAL_COLUMNS: &str = "chemical_id, common_name, name_hash_id, formula, ptx_code";

/// Repository for chemicals
#[derive(Clone)]
pub struct ChemicalRepository {
    pool: PgPool,
}

impl ChemicalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, chemical), fields(db.table = "chemical", db.operation = "insert", name = %chemical.common_name))]
    pub async fn create(&self, chemical: &NewChemical) -> Result<Chemical, AppError> {
        chemical.validate()?;

        sqlx::query_as::<Postgres, Chemical>(&format!(
            r#"
            INSERT INTO chemical (common_name, name_hash_id, formula, ptx_code)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            CHEMICAL_COLUMNS
        ))
        .bind(&chemical.common_name)
        .bind(&chemical.name_hash_id)
        .bind(&chemical.formula)
        .bind(chemical.ptx_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidState(format!(
                    "Chemical {} or code {:03} already exists",
                    chemical.common_name, chemical.ptx_code
                ))
            } else {
                e.into()
            }
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "chemical", db.operation = "select", db.record_id = chemical_id))]
    pub async fn get(&self, chemical_id: i32) -> Result<Option<Chemical>, AppError> {
        let chemical = sqlx::query_as::<Postgres, Chemical>(&format!(
            "SELECT {} FROM chemical WHERE chemical_id = $1",
            CHEMICAL_COLUMNS
        ))
        .bind(chemical_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chemical)
    }

    #[tracing::instrument(skip(self), fields(db.table = "chemical", db.operation = "select"))]
    pub async fn get_by_name(&self, common_name: &str) -> Result<Option<Chemical>, AppError> {
        let chemical = sqlx::query_as::<Postgres, Chemical>(&format!(
            "SELECT {} FROM chemical WHERE common_name = $1",
            CHEMICAL_COLUMNS
        ))
        .bind(common_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chemical)
    }

    /// Zero-padded PTX codes of the named chemicals
    pub async fn code_mapping(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, String>, AppError> {
        let chemicals = self.resolve(names).await?;
        Ok(chemicals
            .into_iter()
            .map(|(name, chemical)| (name, chemical.code()))
            .collect())
    }
}

#[async_trait]
impl ChemicalResolver for ChemicalRepository {
    #[tracing::instrument(skip(self), fields(db.table = "chemical", db.operation = "select", count = names.len()))]
    async fn resolve(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Chemical>, AppError> {
        let wanted: Vec<String> = names.iter().cloned().collect();
        let rows = sqlx::query_as::<Postgres, Chemical>(&format!(
            "SELECT {} FROM chemical WHERE common_name = ANY($1)",
            CHEMICAL_COLUMNS
        ))
        .bind(&wanted)
        .fetch_all(&self.pool)
        .await?;

        let mut found: BTreeMap<String, Chemical> = rows
            .into_iter()
            .map(|chemical| (chemical.common_name.clone(), chemical))
            .collect();

        if let Some(missing) = names.iter().find(|name| !found.contains_key(*name)) {
            return Err(AppError::NotFound(format!("Chemical '{}'", missing)));
        }
        found.retain(|name, _| names.contains(name));
        Ok(found)
    }
}
