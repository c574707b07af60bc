//! File shipment state machine.
//!
//! Transitions are split in two steps. `plan_*` checks the guards against the
//! current entity and returns a plan without touching it; `apply_*` mutates the
//! entity and is only called once the store has durably accepted the plan.
//! Guards run in a fixed order: caller permission, then entity state, then dates.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppError;
use crate::models::{Caller, File, ValidationStatus};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date into a midnight timestamp.
pub fn parse_date(raw: &str) -> Result<NaiveDateTime, AppError> {
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        AppError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD: {}", raw, e))
    })?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unvalidated,
    ValidationFailed,
    Validated,
    Shipped,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentPlan {
    pub file_id: i32,
    pub ship_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceptionPlan {
    pub file_id: i32,
    pub receive_date: NaiveDateTime,
}

impl File {
    pub fn state(&self) -> LifecycleState {
        if self.received {
            LifecycleState::Received
        } else if self.shipped {
            LifecycleState::Shipped
        } else {
            match self.validated {
                ValidationStatus::NotValidated => LifecycleState::Unvalidated,
                ValidationStatus::Failed => LifecycleState::ValidationFailed,
                ValidationStatus::Success => LifecycleState::Validated,
            }
        }
    }

    /// Author or admin may ship, edit and remove.
    pub fn authorize_owner(&self, caller: &Caller, action: &str) -> Result<(), AppError> {
        if caller.user_id == self.author_id || caller.is_admin() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "User {} cannot {} file {}",
                caller.user_id, action, self.file_id
            )))
        }
    }

    pub fn authorize_removal(&self, caller: &Caller) -> Result<(), AppError> {
        self.authorize_owner(caller, "remove")
    }

    /// Validation is open until the file ships; after that the stored
    /// outcome is frozen.
    pub fn ensure_validatable(&self) -> Result<(), AppError> {
        if self.shipped {
            return Err(AppError::InvalidState(format!(
                "File {} has already been shipped and cannot be validated again",
                self.file_id
            )));
        }
        Ok(())
    }

    pub fn plan_shipment(
        &self,
        caller: &Caller,
        at: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<ShipmentPlan, AppError> {
        self.authorize_owner(caller, "ship")?;
        if self.validated != ValidationStatus::Success {
            return Err(AppError::InvalidState(format!(
                "File {} must be validated before being shipped (status: {})",
                self.file_id, self.validated
            )));
        }
        if self.shipped {
            return Err(AppError::InvalidState(format!(
                "File {} has already been shipped",
                self.file_id
            )));
        }
        let ship_date = self.validate_time(at, "shipped", now)?;
        Ok(ShipmentPlan {
            file_id: self.file_id,
            ship_date,
        })
    }

    pub fn plan_reception(
        &self,
        caller: &Caller,
        at: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<ReceptionPlan, AppError> {
        if !caller.is_admin() {
            return Err(AppError::PermissionDenied(format!(
                "User {} cannot mark file {} as received",
                caller.user_id, self.file_id
            )));
        }
        if !self.shipped {
            return Err(AppError::InvalidState(format!(
                "File {} has not been shipped yet",
                self.file_id
            )));
        }
        if self.received {
            return Err(AppError::InvalidState(format!(
                "File {} has already been received",
                self.file_id
            )));
        }
        let receive_date = self.validate_time(at, "received", now)?;
        if let Some(ship_date) = self.ship_date {
            if receive_date < ship_date {
                return Err(AppError::OrderingViolation(format!(
                    "File {} cannot be received before it was shipped ({})",
                    self.file_id,
                    ship_date.format(DATE_FORMAT)
                )));
            }
        }
        Ok(ReceptionPlan {
            file_id: self.file_id,
            receive_date,
        })
    }

    pub fn apply_shipment(&mut self, plan: &ShipmentPlan) {
        self.shipped = true;
        self.ship_date = Some(plan.ship_date);
    }

    pub fn apply_reception(&mut self, plan: &ReceptionPlan) {
        self.received = true;
        self.receive_date = Some(plan.receive_date);
    }

    pub fn apply_validation(&mut self, status: ValidationStatus) {
        self.validated = status;
    }

    fn validate_time(
        &self,
        at: Option<&str>,
        field: &str,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, AppError> {
        let date = match at {
            Some(raw) => parse_date(raw)?,
            None => now,
        };
        if date < self.start_date {
            return Err(AppError::OrderingViolation(format!(
                "File {} cannot be {} before the start date of the experiment.",
                self.file_id, field
            )));
        }
        if date < self.end_date {
            return Err(AppError::OrderingViolation(format!(
                "File {} cannot be {} before the end date of the experiment.",
                self.file_id, field
            )));
        }
        Ok(date)
    }
}
