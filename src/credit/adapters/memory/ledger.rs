//! In-memory repository for credit ledger tests and single-process use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::credit::{
    domain::{CreditEvent, IdempotencyKey},
    ports::{CreditBalance, CreditLedgerRepository, CreditLedgerRepositoryError, CreditLedgerResult},
};
use crate::identity::UserId;

/// Thread-safe in-memory credit ledger repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCreditLedger {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    events: Vec<CreditEvent>,
    keys: HashSet<IdempotencyKey>,
    balances: HashMap<UserId, CreditBalance>,
}

impl InMemoryCreditLedger {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> CreditLedgerRepositoryError {
    CreditLedgerRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl CreditLedgerRepository for InMemoryCreditLedger {
    async fn append(&self, event: &CreditEvent) -> CreditLedgerResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.keys.contains(event.idempotency_key()) {
            return Err(CreditLedgerRepositoryError::DuplicateKey(
                event.idempotency_key().clone(),
            ));
        }
        state.keys.insert(event.idempotency_key().clone());
        state.events.push(event.clone());
        Ok(())
    }

    async fn find_by_key(&self, key: &IdempotencyKey) -> CreditLedgerResult<Option<CreditEvent>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .events
            .iter()
            .find(|event| event.idempotency_key() == key)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> CreditLedgerResult<Vec<CreditEvent>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .events
            .iter()
            .filter(|event| event.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn recompute_balance(
        &self,
        user_id: UserId,
        computed_at: DateTime<Utc>,
    ) -> CreditLedgerResult<CreditBalance> {
        let mut state = self.state.write().map_err(lock_error)?;
        let balance = state
            .events
            .iter()
            .filter(|event| event.user_id() == user_id && event.processed())
            .map(|event| event.amount().value())
            .sum();
        let snapshot = CreditBalance {
            user_id,
            balance,
            computed_at,
        };
        state.balances.insert(user_id, snapshot);
        Ok(snapshot)
    }

    async fn balance(&self, user_id: UserId) -> CreditLedgerResult<Option<CreditBalance>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.balances.get(&user_id).copied())
    }
}
