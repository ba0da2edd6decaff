//! Errors from repository operations that enforce workflow rules.

use domain::errors::WorkflowError;
use thiserror::Error;

/// Failure of a guarded write: the store failed, the row was missing, or a
/// state-machine rule rejected the change inside the transaction.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("{0} not found")]
    NotFound(&'static str),
}
