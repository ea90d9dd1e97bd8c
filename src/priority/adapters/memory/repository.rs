//! In-memory repository for priority ledger tests and single-process use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::UserId;
use crate::priority::{
    domain::{PriorityItem, PriorityItemId, PriorityKey},
    ports::{PriorityRepository, PriorityRepositoryError, PriorityRepositoryResult},
};

/// Thread-safe in-memory priority repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriorityRepository {
    state: Arc<RwLock<InMemoryPriorityState>>,
}

#[derive(Debug, Default)]
struct InMemoryPriorityState {
    items: HashMap<PriorityItemId, PriorityItem>,
    key_index: HashMap<PriorityKey, PriorityItemId>,
}

impl InMemoryPriorityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> PriorityRepositoryError {
    PriorityRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl PriorityRepository for InMemoryPriorityRepository {
    async fn insert(&self, item: &PriorityItem) -> PriorityRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.key_index.contains_key(&item.key()) {
            return Err(PriorityRepositoryError::DuplicateKey(item.key()));
        }
        state.key_index.insert(item.key(), item.id());
        state.items.insert(item.id(), item.clone());
        Ok(())
    }

    async fn update(&self, item: &PriorityItem) -> PriorityRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.items.contains_key(&item.id()) {
            return Err(PriorityRepositoryError::NotFound(item.id()));
        }
        state.items.insert(item.id(), item.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: PriorityItemId,
    ) -> PriorityRepositoryResult<Option<PriorityItem>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.items.get(&id).cloned())
    }

    async fn find_by_key(
        &self,
        key: &PriorityKey,
    ) -> PriorityRepositoryResult<Option<PriorityItem>> {
        let state = self.state.read().map_err(lock_error)?;
        let item = state
            .key_index
            .get(key)
            .and_then(|id| state.items.get(id))
            .cloned();
        Ok(item)
    }

    async fn list_surfaceable_for_user(
        &self,
        user_id: UserId,
    ) -> PriorityRepositoryResult<Vec<PriorityItem>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut items: Vec<PriorityItem> = state
            .items
            .values()
            .filter(|item| item.user_id() == user_id && item.is_surfaceable())
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.value_score()
                .cmp(&a.value_score())
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        Ok(items)
    }
}
