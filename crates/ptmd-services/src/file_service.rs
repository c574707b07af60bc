//! File service
//!
//! Orchestrates the file lifecycle across the store, the drive, the extractor
//! and the validator. Lifecycle guards live on [`File`]; this service loads the
//! entity, asks it for a plan, persists the plan with a conditional write and
//! only then applies it to the in-memory entity.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use ptmd_core::models::{
    Caller, File, FileFilter, FileLabels, FileView, NewFile, ResolvedReferences, ValidationReport,
    ValidationStatus,
};
use ptmd_core::{AppError, FileStore, ReferenceLookup};
use ptmd_storage::{Storage, StorageError};

use crate::extractor::SpreadsheetExtractor;
use crate::validator::FileValidator;

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Clone)]
pub struct FileService {
    files: Arc<dyn FileStore>,
    references: Arc<dyn ReferenceLookup>,
    storage: Arc<dyn Storage>,
    extractor: Arc<SpreadsheetExtractor>,
    validator: Arc<dyn FileValidator>,
    clock: Clock,
}

impl FileService {
    pub fn new(
        files: Arc<dyn FileStore>,
        references: Arc<dyn ReferenceLookup>,
        storage: Arc<dyn Storage>,
        extractor: Arc<SpreadsheetExtractor>,
        validator: Arc<dyn FileValidator>,
    ) -> Self {
        Self {
            files,
            references,
            storage,
            extractor,
            validator,
            clock: Arc::new(|| Utc::now().naive_utc()),
        }
    }

    /// Replace the source of "now" used when no date is supplied.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub async fn get(&self, file_id: i32) -> Result<File, AppError> {
        self.files
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {}", file_id)))
    }

    /// Present a file with the names of the rows it references.
    pub async fn view(&self, file: &File) -> Result<FileView, AppError> {
        let labels = FileLabels {
            organisation: self.references.organisation(file.organisation_id).await?.name,
            author: self.references.username(file.author_id).await?,
            organism: self
                .references
                .organism(file.organism_id)
                .await?
                .ptox_biosystem_name,
            vehicle: self.references.vehicle(file.vehicle_id).await?.common_name,
        };
        Ok(FileView::new(file, labels))
    }

    /// Register a spreadsheet already on the drive under `gdrive_id`.
    #[tracing::instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn register(
        &self,
        caller: &Caller,
        gdrive_id: &str,
        name: Option<String>,
    ) -> Result<File, AppError> {
        let data = self.storage.download(gdrive_id).await?;
        let record = self.extractor.extract(&data).await?;

        let references = ResolvedReferences {
            organisation: self
                .references
                .organisation_by_name(&record.organisation_name)
                .await?,
            organism: self.references.organism_by_name(&record.organism_name).await?,
            vehicle: self.references.vehicle_by_name(&record.vehicle_name).await?,
        };

        let new_file = NewFile::from_extraction(
            record,
            &references,
            gdrive_id.to_string(),
            name,
            caller.user_id,
        )?;
        let file = self.files.insert(new_file).await?;

        tracing::info!(file_id = file.file_id, batch = %file.batch, "File registered");
        Ok(file)
    }

    /// Upload a spreadsheet to the organisation's drive folder and register it.
    /// The uploaded copy is deleted again when registration fails.
    #[tracing::instrument(skip(self, caller, data), fields(user_id = caller.user_id, size = data.len()))]
    pub async fn upload_and_register(
        &self,
        caller: &Caller,
        organisation_id: i32,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<File, AppError> {
        let organisation = self.references.organisation(organisation_id).await?;
        let key = self
            .storage
            .upload(organisation.gdrive_id.as_deref(), filename, data)
            .await?;

        match self.register(caller, &key, Some(filename.to_string())).await {
            Ok(file) => Ok(file),
            Err(err) => {
                if let Err(cleanup) = self.storage.delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove upload after rejected registration");
                }
                Err(err)
            }
        }
    }

    /// Run the validator on the drive copy and store the outcome. Validating
    /// again overwrites the previous status until the file ships.
    #[tracing::instrument(skip(self))]
    pub async fn validate(&self, file_id: i32) -> Result<ValidationReport, AppError> {
        let mut file = self.get(file_id).await?;
        file.ensure_validatable()?;
        let data = self.storage.download(&file.gdrive_id).await?;
        let report = self.validator.validate(&data);

        let status = ValidationStatus::from_report(&report);
        if !self.files.set_validation(file_id, status).await? {
            return Err(AppError::InvalidState(format!(
                "File {} was shipped while being validated",
                file_id
            )));
        }
        file.apply_validation(status);

        tracing::info!(file_id, status = %status, errors = report.errors.len(), "File validated");
        Ok(report)
    }

    #[tracing::instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn ship(
        &self,
        caller: &Caller,
        file_id: i32,
        at: Option<&str>,
    ) -> Result<File, AppError> {
        let mut file = self.get(file_id).await?;
        let plan = file.plan_shipment(caller, at, (self.clock)())?;

        if !self.files.record_shipment(&plan).await? {
            return Err(AppError::InvalidState(format!(
                "File {} has already been shipped",
                file_id
            )));
        }
        file.apply_shipment(&plan);

        if let Err(err) = self.storage.lock(&file.gdrive_id).await {
            tracing::warn!(file_id, error = %err, "Failed to make shipped file read-only");
        }

        tracing::info!(file_id, ship_date = %plan.ship_date, "File shipped");
        Ok(file)
    }

    #[tracing::instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn receive(
        &self,
        caller: &Caller,
        file_id: i32,
        at: Option<&str>,
    ) -> Result<File, AppError> {
        let mut file = self.get(file_id).await?;
        let plan = file.plan_reception(caller, at, (self.clock)())?;

        if !self.files.record_reception(&plan).await? {
            return Err(AppError::InvalidState(format!(
                "File {} has already been received",
                file_id
            )));
        }
        file.apply_reception(&plan);

        tracing::info!(file_id, receive_date = %plan.receive_date, "File received");
        Ok(file)
    }

    /// Delete the drive copy, then the record. A drive copy the service may
    /// not delete, or that is already gone, does not block removal.
    #[tracing::instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn remove(&self, caller: &Caller, file_id: i32) -> Result<(), AppError> {
        let file = self.get(file_id).await?;
        file.authorize_removal(caller)?;

        match self.storage.delete(&file.gdrive_id).await {
            Ok(()) => {}
            Err(err @ (StorageError::PermissionDenied(_) | StorageError::NotFound(_))) => {
                tracing::warn!(file_id, error = %err, "Drive copy left in place");
            }
            Err(err) => return Err(err.into()),
        }

        self.files.delete(file_id).await?;
        tracing::info!(file_id, "File removed");
        Ok(())
    }

    pub async fn search(&self, filter: &FileFilter) -> Result<Vec<File>, AppError> {
        self.files.search(filter).await
    }

    /// Whether `batch` is a well-formed code still free in the organisation.
    pub async fn batch_validation(&self, organisation_id: i32, batch: &str) -> Result<bool, AppError> {
        check_batch_format(batch)?;
        Ok(!self.files.batch_in_use(organisation_id, batch).await?)
    }

    #[tracing::instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn update_batch(
        &self,
        caller: &Caller,
        file_id: i32,
        batch: &str,
    ) -> Result<File, AppError> {
        let mut file = self.get(file_id).await?;
        file.authorize_owner(caller, "edit")?;
        check_batch_format(batch)?;
        if file.batch == batch {
            return Ok(file);
        }
        if self.files.batch_in_use(file.organisation_id, batch).await? {
            return Err(AppError::InvalidState(format!(
                "Batch {} is already used",
                batch
            )));
        }

        self.files.update_batch(file_id, batch).await?;
        file.batch = batch.to_string();
        tracing::info!(file_id, batch, "File batch updated");
        Ok(file)
    }
}

fn check_batch_format(batch: &str) -> Result<(), AppError> {
    if batch.len() == 2 && batch.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Batch '{}' must be two uppercase letters",
            batch
        )))
    }
}
