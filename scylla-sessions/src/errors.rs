//! Errors returned and classified by this crate.

use scylla::errors::{DbError, ExecutionError, RequestAttemptError};
use thiserror::Error;

/// Distinguishes errors in which the database understood a schema statement
/// but rejected one of its configuration values as unsupported.
///
/// Schema bootstrap only falls back to an alternative statement for errors
/// classified this way. Everything else is returned to the caller unchanged.
pub trait ConfigurationRejection {
    /// Returns true if the error is a configuration rejection.
    fn is_configuration_rejection(&self) -> bool;
}

impl ConfigurationRejection for ExecutionError {
    fn is_configuration_rejection(&self) -> bool {
        matches!(
            self,
            ExecutionError::LastAttemptError(RequestAttemptError::DbError(
                DbError::ConfigError,
                _
            ))
        )
    }
}

/// Failure observed through a [`PendingOperation`](crate::pending::PendingOperation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AsyncOperationError<E> {
    /// The underlying request completed with an error.
    #[error(transparent)]
    Failed(E),

    /// The producer went away without settling the operation,
    /// e.g. because the task driving the request panicked or the runtime shut down.
    #[error("Asynchronous operation was abandoned before completing")]
    Abandoned,
}

impl<E> AsyncOperationError<E> {
    /// Returns the underlying request error, if there is one.
    pub fn as_failed(&self) -> Option<&E> {
        match self {
            AsyncOperationError::Failed(err) => Some(err),
            AsyncOperationError::Abandoned => None,
        }
    }
}
