//! Database transaction utilities
//!
//! Multi-statement writes (a file and its association rows) go through
//! [`TransactionGuard`] so they commit together or not at all.

use ptmd_core::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// A transaction that must be committed explicitly
///
/// Dropping the guard without calling [`TransactionGuard::commit`] rolls the
/// transaction back.
///
/// # Example
///
/// ```ignore
/// use ptmd_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), ptmd_core::AppError> {
///     let mut tx = TransactionGuard::begin(pool, "example").await?;
///     sqlx::query("INSERT INTO ...").execute(tx.conn()?).await?;
///     tx.commit().await
/// }
/// ```
pub struct TransactionGuard<'a> {
    transaction: Option<Transaction<'a, Postgres>>,
    operation: &'static str,
}

impl<'a> TransactionGuard<'a> {
    /// Begin a new database transaction
    pub async fn begin(pool: &'a PgPool, operation: &'static str) -> Result<Self, AppError> {
        let transaction = pool.begin().await?;

        Ok(Self {
            transaction: Some(transaction),
            operation,
        })
    }

    /// Connection to run statements on inside the transaction
    pub fn conn(&mut self) -> Result<&mut PgConnection, AppError> {
        let operation = self.operation;
        self.transaction
            .as_mut()
            .map(|tx| &mut **tx)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Transaction for {} was already finished",
                    operation
                ))
            })
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            tracing::warn!(
                operation = self.operation,
                "Transaction dropped without commit - rolling back"
            );
        }
    }
}
