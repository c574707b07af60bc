//! In-memory collaborators with the same guards as the Postgres repositories.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ptmd_core::mappings::timepoint_label;
use ptmd_core::models::{
    Chemical, Dose, File, FileFilter, NewDose, NewFile, Organisation, Organism, Timepoint,
    ValidationStatus, TIMEPOINT_UNIT,
};
use ptmd_core::{
    AppError, ChemicalResolver, DoseNormalizer, FileStore, ReceptionPlan, ReferenceLookup,
    ShipmentPlan, StorageBackend, TimepointNormalizer,
};
use ptmd_storage::{Storage, StorageError, StorageResult};

#[derive(Default)]
pub struct InMemoryFileStore {
    files: Mutex<BTreeMap<i32, File>>,
    next_id: AtomicI32,
}

impl InMemoryFileStore {
    pub fn snapshot(&self, file_id: i32) -> Option<File> {
        self.files.lock().unwrap().get(&file_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn insert(&self, file: NewFile) -> Result<File, AppError> {
        let mut files = self.files.lock().unwrap();
        if files
            .values()
            .any(|f| f.organisation_id == file.organisation_id && f.batch == file.batch)
        {
            return Err(AppError::InvalidState(format!(
                "Batch {} is already registered",
                file.batch
            )));
        }
        let file_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = File {
            file_id,
            gdrive_id: file.gdrive_id,
            name: file.name,
            batch: file.batch,
            validated: ValidationStatus::NotValidated,
            replicates: file.replicates,
            controls: file.controls,
            blanks: file.blanks,
            shipped: false,
            received: false,
            start_date: file.start_date,
            end_date: file.end_date,
            ship_date: None,
            receive_date: None,
            organisation_id: file.organisation_id,
            author_id: file.author_id,
            organism_id: file.organism_id,
            vehicle_id: file.vehicle_id,
            chemicals: file.chemicals,
            doses: file.doses,
            timepoints: file.timepoints,
        };
        files.insert(file_id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, file_id: i32) -> Result<Option<File>, AppError> {
        Ok(self.snapshot(file_id))
    }

    async fn set_validation(&self, file_id: i32, status: ValidationStatus) -> Result<bool, AppError> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&file_id) {
            Some(file) if !file.shipped => {
                file.apply_validation(status);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_shipment(&self, plan: &ShipmentPlan) -> Result<bool, AppError> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&plan.file_id) {
            Some(file) if !file.shipped && file.validated == ValidationStatus::Success => {
                file.apply_shipment(plan);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_reception(&self, plan: &ReceptionPlan) -> Result<bool, AppError> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&plan.file_id) {
            Some(file)
                if file.shipped
                    && !file.received
                    && file.ship_date.is_some_and(|d| d <= plan.receive_date) =>
            {
                file.apply_reception(plan);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_batch(&self, file_id: i32, batch: &str) -> Result<(), AppError> {
        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(&file_id)
            .ok_or_else(|| AppError::NotFound(format!("File {}", file_id)))?;
        file.batch = batch.to_string();
        Ok(())
    }

    async fn batch_in_use(&self, organisation_id: i32, batch: &str) -> Result<bool, AppError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .values()
            .any(|f| f.organisation_id == organisation_id && f.batch == batch))
    }

    async fn delete(&self, file_id: i32) -> Result<(), AppError> {
        self.files
            .lock()
            .unwrap()
            .remove(&file_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("File {}", file_id)))
    }

    async fn search(&self, filter: &FileFilter) -> Result<Vec<File>, AppError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect())
    }
}

pub fn chemical(chemical_id: i32, common_name: &str, ptx_code: i32) -> Chemical {
    Chemical {
        chemical_id,
        common_name: common_name.to_string(),
        name_hash_id: None,
        formula: None,
        ptx_code,
    }
}

/// Knows chemicals `X` (1), `Y` (2) and the vehicle `DMSO` (10).
pub struct FakeChemicals {
    known: BTreeMap<String, Chemical>,
}

impl Default for FakeChemicals {
    fn default() -> Self {
        let known = [chemical(1, "X", 1), chemical(2, "Y", 2), chemical(10, "DMSO", 998)]
            .into_iter()
            .map(|c| (c.common_name.clone(), c))
            .collect();
        Self { known }
    }
}

#[async_trait]
impl ChemicalResolver for FakeChemicals {
    async fn resolve(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Chemical>, AppError> {
        names
            .iter()
            .map(|name| {
                self.known
                    .get(name)
                    .cloned()
                    .map(|c| (name.clone(), c))
                    .ok_or_else(|| AppError::NotFound(format!("Chemical '{}'", name)))
            })
            .collect()
    }
}

#[derive(Default)]
pub struct FakeTimepoints;

#[async_trait]
impl TimepointNormalizer for FakeTimepoints {
    async fn normalize(&self, hours: &[i32]) -> Result<Vec<Timepoint>, AppError> {
        hours
            .iter()
            .enumerate()
            .map(|(index, value)| {
                if *value < 0 {
                    return Err(AppError::InvalidInput(format!(
                        "Timepoint {} must not be negative",
                        value
                    )));
                }
                Ok(Timepoint {
                    timepoint_id: index as i32 + 1,
                    value: *value,
                    unit: TIMEPOINT_UNIT.to_string(),
                    label: timepoint_label(index + 1),
                })
            })
            .collect()
    }
}

#[derive(Default)]
pub struct FakeDoses;

#[async_trait]
impl DoseNormalizer for FakeDoses {
    async fn normalize(&self, levels: &BTreeSet<String>) -> Result<Vec<Dose>, AppError> {
        levels
            .iter()
            .enumerate()
            .map(|(index, level)| {
                let dose = NewDose::from_level(level)?;
                Ok(Dose {
                    dose_id: index as i32 + 1,
                    value: dose.value,
                    unit: dose.unit,
                    label: dose.label,
                })
            })
            .collect()
    }
}

/// Organisation `UOB` (1, folder `folder-uob`), organism `zebrafish` (1), the
/// `DMSO` vehicle (10) and users `author` (1), `stranger` (2), `admin` (3).
#[derive(Default)]
pub struct FakeReferences;

#[async_trait]
impl ReferenceLookup for FakeReferences {
    async fn organisation(&self, organisation_id: i32) -> Result<Organisation, AppError> {
        if organisation_id == 1 {
            self.organisation_by_name("UOB").await
        } else {
            Err(AppError::NotFound(format!("Organisation {}", organisation_id)))
        }
    }

    async fn organism(&self, organism_id: i32) -> Result<Organism, AppError> {
        if organism_id == 1 {
            self.organism_by_name("zebrafish").await
        } else {
            Err(AppError::NotFound(format!("Organism {}", organism_id)))
        }
    }

    async fn vehicle(&self, chemical_id: i32) -> Result<Chemical, AppError> {
        if chemical_id == 10 {
            self.vehicle_by_name("DMSO").await
        } else {
            Err(AppError::NotFound(format!("Vehicle {}", chemical_id)))
        }
    }

    async fn username(&self, user_id: i32) -> Result<String, AppError> {
        match user_id {
            1 => Ok("author".to_string()),
            2 => Ok("stranger".to_string()),
            3 => Ok("admin".to_string()),
            other => Err(AppError::NotFound(format!("User {}", other))),
        }
    }

    async fn organisation_by_name(&self, name: &str) -> Result<Organisation, AppError> {
        match name {
            "UOB" => Ok(Organisation {
                organisation_id: 1,
                name: "UOB".to_string(),
                gdrive_id: Some("folder-uob".to_string()),
                longname: None,
            }),
            other => Err(AppError::NotFound(format!("Organisation '{}'", other))),
        }
    }

    async fn organism_by_name(&self, name: &str) -> Result<Organism, AppError> {
        match name {
            "zebrafish" => Ok(Organism {
                organism_id: 1,
                ptox_biosystem_name: "zebrafish".to_string(),
                scientific_name: Some("Danio rerio".to_string()),
                ptox_biosystem_code: "Z".to_string(),
            }),
            other => Err(AppError::NotFound(format!("Organism '{}'", other))),
        }
    }

    async fn vehicle_by_name(&self, name: &str) -> Result<Chemical, AppError> {
        match name {
            "DMSO" => Ok(chemical(10, "DMSO", 998)),
            other => Err(AppError::NotFound(format!("Vehicle '{}'", other))),
        }
    }
}

/// Drive held in memory. `deny_delete` makes deletes fail like a file owned
/// by someone else.
#[derive(Default)]
pub struct FakeDrive {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    locked: Mutex<BTreeSet<String>>,
    next_id: AtomicI32,
    deny_delete: bool,
    broken: bool,
}

impl FakeDrive {
    pub fn denying_delete() -> Self {
        Self {
            deny_delete: true,
            ..Default::default()
        }
    }

    /// Every delete and lock fails with a backend error.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn with_file(self, key: &str, data: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(key.to_string(), data);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locked.lock().unwrap().contains(key)
    }
}

#[async_trait]
impl Storage for FakeDrive {
    async fn upload(
        &self,
        folder: Option<&str>,
        _filename: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let key = format!("{}-{}", folder.unwrap_or("root"), id);
        self.files.lock().unwrap().insert(key.clone(), data);
        Ok(key)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.broken {
            return Err(StorageError::BackendError("drive unavailable".to_string()));
        }
        if self.deny_delete {
            return Err(StorageError::PermissionDenied(storage_key.to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .remove(storage_key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn lock(&self, storage_key: &str) -> StorageResult<()> {
        if self.broken {
            return Err(StorageError::BackendError("drive unavailable".to_string()));
        }
        self.locked.lock().unwrap().insert(storage_key.to_string());
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.contains(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
