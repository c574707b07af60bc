//! Seed bootstrap
//!
//! Loads organisations, users, chemicals and organisms from a seed document.
//! Each item is created independently and yields a [`CreationReport`]; one bad
//! item never aborts the rest. Rejected input and existing rows are reported as
//! skipped, anything else as failed.

use std::fmt;

use ptmd_core::models::{NewChemical, NewOrganisation, NewOrganism, NewUser};
use ptmd_core::AppError;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{ChemicalRepository, OrganisationRepository, OrganismRepository, UserRepository};

/// Seed document, usually read from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub organisations: Vec<NewOrganisation>,
    #[serde(default)]
    pub users: Vec<NewUser>,
    #[serde(default)]
    pub chemicals: Vec<NewChemical>,
    #[serde(default)]
    pub organisms: Vec<NewOrganism>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CreationOutcome {
    Created { id: i32 },
    Skipped { reason: String },
    Failed { error: String },
}

impl CreationOutcome {
    /// Classify the result of creating one item.
    pub fn from_result<T>(result: Result<T, AppError>, id: impl FnOnce(&T) -> i32) -> Self {
        match result {
            Ok(value) => CreationOutcome::Created { id: id(&value) },
            Err(
                err @ (AppError::InvalidInput(_)
                | AppError::InvalidState(_)
                | AppError::NotFound(_)),
            ) => CreationOutcome::Skipped {
                reason: err.to_string(),
            },
            Err(err) => CreationOutcome::Failed {
                error: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreationReport {
    pub entity: &'static str,
    pub key: String,
    #[serde(flatten)]
    pub outcome: CreationOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BootReport {
    pub items: Vec<CreationReport>,
}

impl BootReport {
    fn push(&mut self, entity: &'static str, key: &str, outcome: CreationOutcome) {
        match &outcome {
            CreationOutcome::Created { id } => {
                tracing::info!(entity, key, id, "Seed item created")
            }
            CreationOutcome::Skipped { reason } => {
                tracing::warn!(entity, key, reason = %reason, "Seed item skipped")
            }
            CreationOutcome::Failed { error } => {
                tracing::error!(entity, key, error = %error, "Seed item failed")
            }
        }
        self.items.push(CreationReport {
            entity,
            key: key.to_string(),
            outcome,
        });
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, CreationOutcome::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CreationOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CreationOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&CreationOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| predicate(&item.outcome)).count()
    }
}

impl fmt::Display for BootReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} skipped, {} failed",
            self.created(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Runs a seed document against the database
pub struct Bootstrapper {
    organisations: OrganisationRepository,
    users: UserRepository,
    chemicals: ChemicalRepository,
    organisms: OrganismRepository,
}

impl Bootstrapper {
    pub fn new(pool: PgPool) -> Self {
        Self {
            organisations: OrganisationRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            chemicals: ChemicalRepository::new(pool.clone()),
            organisms: OrganismRepository::new(pool),
        }
    }

    /// Create every seed item. Organisations go first so users can reference them.
    pub async fn run(&self, seed: &SeedData) -> BootReport {
        let mut report = BootReport::default();

        for organisation in &seed.organisations {
            let result = self.organisations.create(organisation).await;
            report.push(
                "organisation",
                &organisation.name,
                CreationOutcome::from_result(result, |o| o.organisation_id),
            );
        }

        for user in &seed.users {
            let result = self.create_user(user).await;
            report.push(
                "user",
                &user.username,
                CreationOutcome::from_result(result, |u| u.id),
            );
        }

        for chemical in &seed.chemicals {
            let result = self.chemicals.create(chemical).await;
            report.push(
                "chemical",
                &chemical.common_name,
                CreationOutcome::from_result(result, |c| c.chemical_id),
            );
        }

        for organism in &seed.organisms {
            let result = self.organisms.create(organism).await;
            report.push(
                "organism",
                &organism.ptox_biosystem_name,
                CreationOutcome::from_result(result, |o| o.organism_id),
            );
        }

        tracing::info!(%report, "Database boot completed");
        report
    }

    async fn create_user(&self, user: &NewUser) -> Result<ptmd_core::models::User, AppError> {
        let organisation_id = match &user.organisation {
            Some(name) => Some(
                self.organisations
                    .get_by_name(name)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Organisation '{}'", name)))?
                    .organisation_id,
            ),
            None => None,
        };
        self.users.create(user, organisation_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_input_is_skipped_not_failed() {
        let outcome = CreationOutcome::from_result::<i32>(
            Err(AppError::InvalidInput("bad email".into())),
            |id| *id,
        );
        assert!(matches!(outcome, CreationOutcome::Skipped { .. }));

        let outcome = CreationOutcome::from_result::<i32>(
            Err(AppError::InvalidState("exists".into())),
            |id| *id,
        );
        assert!(matches!(outcome, CreationOutcome::Skipped { .. }));
    }

    #[test]
    fn system_errors_are_failures() {
        let outcome = CreationOutcome::from_result::<i32>(
            Err(AppError::Internal("connection reset".into())),
            |id| *id,
        );
        assert_eq!(
            outcome,
            CreationOutcome::Failed {
                error: "Internal error: connection reset".into()
            }
        );
    }

    #[test]
    fn report_counts_and_serializes() {
        let mut report = BootReport::default();
        report.push("chemical", "DMSO", CreationOutcome::Created { id: 1 });
        report.push(
            "chemical",
            "X",
            CreationOutcome::Skipped {
                reason: "exists".into(),
            },
        );
        assert_eq!(report.to_string(), "1 created, 1 skipped, 0 failed");

        let json = serde_json::to_value(&report.items[0]).unwrap();
        assert_eq!(json["outcome"], "created");
        assert_eq!(json["id"], 1);
        assert_eq!(json["key"], "DMSO");
    }

    #[test]
    fn seed_document_parses_with_missing_sections() {
        let seed: SeedData = serde_json::from_str(
            r#"{
                "organisations": [{"name": "UOB", "gdrive_id": "folder-1"}],
                "chemicals": [{"common_name": "DMSO", "ptx_code": 998}]
            }"#,
        )
        .unwrap();
        assert_eq!(seed.organisations.len(), 1);
        assert!(seed.users.is_empty());
        assert_eq!(seed.chemicals[0].ptx_code, 998);
    }
}
