use core_types::CoreError;
use risk::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("The requested data was not found.")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error("Stored row is malformed: {0}")]
    Corrupt(String),
}
