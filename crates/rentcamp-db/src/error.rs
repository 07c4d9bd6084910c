//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

impl DbError {
    /// Turn a UNIQUE constraint violation into `Duplicate`
    pub(crate) fn unique_violation(err: sqlx::Error, entry: impl FnOnce() -> String) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Duplicate(entry())
            }
            _ => DbError::Connection(err),
        }
    }
}
