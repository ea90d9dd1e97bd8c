//! Error and result types shared by the saga services.

use crate::saga::domain::SagaDomainError;
use crate::saga::ports::{EffectError, SagaRepositoryError};
use thiserror::Error;
use uuid::Uuid;

/// Service-level errors for saga operations.
#[derive(Debug, Error)]
pub enum SagaServiceError {
    /// Domain transition or validation failed.
    #[error(transparent)]
    Domain(#[from] SagaDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] SagaRepositoryError),
    /// A side effect failed.
    #[error(transparent)]
    Effect(#[from] EffectError),
    /// The referenced instance does not exist.
    #[error("saga instance not found: {0}")]
    NotFound(Uuid),
}

/// Result type for saga service operations.
pub type SagaServiceResult<T> = Result<T, SagaServiceError>;
