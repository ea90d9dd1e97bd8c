//! Repository port for ledger persistence and balance caching.

use crate::credit::domain::{CreditEvent, IdempotencyKey};
use crate::identity::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for credit ledger repository operations.
pub type CreditLedgerResult<T> = Result<T, CreditLedgerRepositoryError>;

/// Cached per-user balance snapshot.
///
/// A pure read optimization: the ledger lines remain authoritative and the
/// snapshot is recomputed explicitly after every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditBalance {
    /// Account the snapshot belongs to.
    pub user_id: UserId,
    /// Sum of processed line amounts.
    pub balance: i64,
    /// When the snapshot was recomputed.
    pub computed_at: DateTime<Utc>,
}

/// Ledger persistence contract.
#[async_trait]
pub trait CreditLedgerRepository: Send + Sync {
    /// Appends a ledger line.
    ///
    /// # Errors
    ///
    /// Returns [`CreditLedgerRepositoryError::DuplicateKey`] when a line
    /// with the same idempotency key already exists.
    async fn append(&self, event: &CreditEvent) -> CreditLedgerResult<()>;

    /// Finds a ledger line by idempotency key.
    ///
    /// Returns `None` when no line carries the key.
    async fn find_by_key(&self, key: &IdempotencyKey) -> CreditLedgerResult<Option<CreditEvent>>;

    /// Returns all ledger lines for a user, oldest first.
    async fn list_for_user(&self, user_id: UserId) -> CreditLedgerResult<Vec<CreditEvent>>;

    /// Recomputes and stores the cached balance for a user from processed
    /// lines, returning the fresh snapshot.
    async fn recompute_balance(
        &self,
        user_id: UserId,
        computed_at: DateTime<Utc>,
    ) -> CreditLedgerResult<CreditBalance>;

    /// Returns the cached balance snapshot, if one has been computed.
    async fn balance(&self, user_id: UserId) -> CreditLedgerResult<Option<CreditBalance>>;
}

/// Errors returned by credit ledger repository implementations.
#[derive(Debug, Clone, Error)]
pub enum CreditLedgerRepositoryError {
    /// A ledger line with the same idempotency key already exists.
    #[error("duplicate idempotency key: {0}")]
    DuplicateKey(IdempotencyKey),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CreditLedgerRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
