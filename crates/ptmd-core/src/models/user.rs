use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use crate::error::AppError;

/// Account role. Only `Admin` carries elevated lifecycle permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Disabled,
    Enabled,
    User,
    Admin,
    Banned,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Disabled => "disabled",
            Role::Enabled => "enabled",
            Role::User => "user",
            Role::Admin => "admin",
            Role::Banned => "banned",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Role::Disabled),
            "enabled" => Ok(Role::Enabled),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "banned" => Ok(Role::Banned),
            other => Err(AppError::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub organisation_id: Option<i32>,
}

impl User {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.id,
            role: self.role,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub organisation_id: Option<i32>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            role: row.role.parse()?,
            organisation_id: row.organisation_id,
        })
    }
}

/// Seed payload for a user account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub organisation: Option<String>,
}

/// Identity of the user performing a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
