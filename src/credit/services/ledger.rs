//! Ledger append and balance orchestration.

use crate::credit::{
    domain::{
        CreditAmount, CreditDomainError, CreditEvent, CreditEventType, CreditReferenceType,
        IdempotencyKey, NewCreditEvent,
    },
    ports::{CreditBalance, CreditLedgerRepository, CreditLedgerRepositoryError},
};
use crate::identity::UserId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Request payload for appending a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendCreditRequest {
    /// Account the line belongs to.
    pub user_id: UserId,
    /// Classification of the line.
    pub event_type: CreditEventType,
    /// Signed amount in credit units.
    pub amount: i64,
    /// Kind of entity the line references.
    pub reference_type: CreditReferenceType,
    /// Identifier of the referenced entity.
    pub reference_id: Uuid,
}

/// Outcome of an append attempt.
///
/// A duplicate is a success from the caller's point of view: the ledger
/// effect has already been applied exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditAppend {
    /// The line was written and the cached balance refreshed.
    Applied(CreditEvent),
    /// A line with the same idempotency key already existed; no-op.
    Duplicate(IdempotencyKey),
}

impl CreditAppend {
    /// Returns the idempotency key of the applied or pre-existing line.
    #[must_use]
    pub fn idempotency_key(&self) -> &IdempotencyKey {
        match self {
            Self::Applied(event) => event.idempotency_key(),
            Self::Duplicate(key) => key,
        }
    }
}

/// Service-level errors for credit ledger operations.
#[derive(Debug, Error)]
pub enum CreditServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] CreditDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] CreditLedgerRepositoryError),
}

/// Result type for credit ledger service operations.
pub type CreditServiceResult<T> = Result<T, CreditServiceError>;

/// Append-only credit ledger service.
#[derive(Clone)]
pub struct CreditLedgerService<R, C>
where
    R: CreditLedgerRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> CreditLedgerService<R, C>
where
    R: CreditLedgerRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new credit ledger service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Appends a ledger line and refreshes the cached balance.
    ///
    /// A second append with the same `(event_type, reference_id)` pair is
    /// reported as [`CreditAppend::Duplicate`] and leaves the ledger
    /// untouched, which makes callers safe under at-least-once event
    /// redelivery.
    ///
    /// # Errors
    ///
    /// Returns [`CreditServiceError`] when the amount is zero or the
    /// repository fails for a non-duplicate reason.
    pub async fn append_credit(
        &self,
        request: AppendCreditRequest,
    ) -> CreditServiceResult<CreditAppend> {
        let amount = CreditAmount::new(request.amount)?;
        let event = CreditEvent::new(
            NewCreditEvent {
                user_id: request.user_id,
                event_type: request.event_type,
                amount,
                reference_type: request.reference_type,
                reference_id: request.reference_id,
            },
            &*self.clock,
        );

        match self.repository.append(&event).await {
            Ok(()) => {
                self.repository
                    .recompute_balance(request.user_id, self.clock.utc())
                    .await?;
                tracing::info!(
                    user = %request.user_id,
                    event_type = request.event_type.as_str(),
                    amount = request.amount,
                    "credit ledger line appended"
                );
                Ok(CreditAppend::Applied(event))
            }
            Err(CreditLedgerRepositoryError::DuplicateKey(key)) => {
                tracing::debug!(
                    user = %request.user_id,
                    key = %key,
                    "duplicate credit append ignored"
                );
                Ok(CreditAppend::Duplicate(key))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Returns the cached balance snapshot for a user, if computed.
    ///
    /// # Errors
    ///
    /// Returns [`CreditServiceError::Repository`] when the lookup fails.
    pub async fn balance(&self, user_id: UserId) -> CreditServiceResult<Option<CreditBalance>> {
        Ok(self.repository.balance(user_id).await?)
    }

    /// Returns all ledger lines for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CreditServiceError::Repository`] when the lookup fails.
    pub async fn history(&self, user_id: UserId) -> CreditServiceResult<Vec<CreditEvent>> {
        Ok(self.repository.list_for_user(user_id).await?)
    }
}
