use ptmd_core::models::{NewUser, User, UserRow};
use ptmd_core::AppError;
use sqlx::{PgPool, Postgres};
use validator::Validate;

use super::is_unique_violation;

/// Repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a user attached to an already-resolved organisation
    #[tracing::instrument(skip(self, user), fields(db.table = "users", db.operation = "insert", username = %user.username))]
    pub async fn create(&self, user: &NewUser, organisation_id: Option<i32>) -> Result<User, AppError> {
        user.validate()?;

        let row = sqlx::query_as::<Postgres, UserRow>(
            r#"
            INSERT INTO users (username, email, role, organisation_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, role, organisation_id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(organisation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidState(format!("User {} already exists", user.username))
            } else {
                e.into()
            }
        })?;

        row.try_into()
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = id))]
    pub async fn get(&self, id: i32) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<Postgres, UserRow>(
            "SELECT id, username, email, role, organisation_id FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<Postgres, UserRow>(
            "SELECT id, username, email, role, organisation_id FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}
