//! Composition root: builds the pool, the drive and the services once.

use std::sync::Arc;

use anyhow::Context;
use ptmd_core::models::Caller;
use ptmd_core::Config;
use ptmd_db::{
    setup_database, ChemicalRepository, DoseRepository, FileRepository, ReferenceRepository,
    TimepointRepository, UserRepository,
};
use ptmd_services::{FileService, SpreadsheetExtractor, SpreadsheetValidator};
use ptmd_storage::create_storage;
use sqlx::PgPool;

pub struct AppContext {
    pub pool: PgPool,
    pub files: FileService,
    pub chemicals: ChemicalRepository,
    users: UserRepository,
}

impl AppContext {
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let pool = setup_database(config).await?;
        let storage = create_storage(config)
            .await
            .context("Failed to initialize drive backend")?;
        tracing::info!(backend = %storage.backend_type(), "Drive backend ready");

        let chemicals = ChemicalRepository::new(pool.clone());
        let extractor = SpreadsheetExtractor::new(
            Arc::new(chemicals.clone()),
            Arc::new(TimepointRepository::new(pool.clone())),
            Arc::new(DoseRepository::new(pool.clone())),
        );
        let validator = SpreadsheetValidator::from_config(config)?;

        let files = FileService::new(
            Arc::new(FileRepository::new(pool.clone())),
            Arc::new(ReferenceRepository::new(pool.clone())),
            storage,
            Arc::new(extractor),
            Arc::new(validator),
        );

        Ok(Self {
            users: UserRepository::new(pool.clone()),
            chemicals,
            files,
            pool,
        })
    }

    /// Resolve the `--user` flag into the caller of a lifecycle operation.
    pub async fn caller(&self, username: Option<&str>) -> anyhow::Result<Caller> {
        let username = username.context("This command needs --user <username>")?;
        let user = self
            .users
            .get_by_username(username)
            .await?
            .with_context(|| format!("Unknown user '{}'", username))?;
        Ok(user.caller())
    }
}
