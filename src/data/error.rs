//! Failure types for the data-access layer.
//!
//! `DbError` is what a unit of work inside a transaction can fail with.
//! `DataAccessError` is what repository callers see: either the connection
//! could not be acquired, or an operation rolled back and carries its cause.

use thiserror::Error;

use super::binder::SqlType;
use super::models::Decimal;

/// Failures raised while a transaction is open
#[derive(Error, Debug)]
pub enum DbError {
    /// Binder type mismatch. Indicates a defect in the calling code.
    #[error("parameter {position} declared as {declared} but given a {actual} value")]
    Validation {
        position: usize,
        declared: SqlType,
        actual: SqlType,
    },

    /// Extractor could not map a column onto an entity attribute
    #[error("cannot map column `{column}` onto {entity}: {reason}")]
    Mapping {
        entity: &'static str,
        column: &'static str,
        reason: String,
    },

    #[error("insert into `{table}` affected no rows")]
    NothingInserted { table: &'static str },

    #[error("no generated identity recorded for table `{table}`")]
    MissingIdentity { table: &'static str },

    /// Decimal outside the `DECIMAL(7,2)` column range
    #[error("parameter {position} value {value} exceeds the decimal column range of ±{max}")]
    DecimalRange {
        position: usize,
        value: Decimal,
        max: Decimal,
    },

    /// Unit of work gave up on its own
    #[cfg(test)]
    #[error("aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Failure surfaced by repository operations
#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("could not acquire a database connection")]
    Acquire(#[source] rusqlite::Error),

    #[error("{operation} failed")]
    Operation {
        operation: &'static str,
        #[source]
        source: DbError,
    },
}

impl DataAccessError {
    /// The failure that caused the rollback, if a transaction was started
    #[cfg(test)]
    pub fn cause(&self) -> Option<&DbError> {
        match self {
            DataAccessError::Acquire(_) => None,
            DataAccessError::Operation { source, .. } => Some(source),
        }
    }
}
