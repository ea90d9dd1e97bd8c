//! In-memory dead-letter store for tests and single-process use.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::event_log::{
    domain::{DeadLetter, DeadLetterId},
    ports::{DeadLetterRepository, EventLogRepositoryError, EventLogResult},
};

/// Thread-safe in-memory dead-letter repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeadLetterStore {
    letters: Arc<RwLock<Vec<DeadLetter>>>,
}

impl InMemoryDeadLetterStore {
    /// Creates an empty in-memory dead-letter store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> EventLogRepositoryError {
    EventLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DeadLetterRepository for InMemoryDeadLetterStore {
    async fn store(&self, letter: &DeadLetter) -> EventLogResult<()> {
        let mut letters = self.letters.write().map_err(lock_error)?;
        letters.push(letter.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: DeadLetterId) -> EventLogResult<Option<DeadLetter>> {
        let letters = self.letters.read().map_err(lock_error)?;
        Ok(letters.iter().find(|letter| letter.id() == id).cloned())
    }

    async fn list(&self, limit: u32) -> EventLogResult<Vec<DeadLetter>> {
        let letters = self.letters.read().map_err(lock_error)?;
        Ok(letters
            .iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn remove(&self, id: DeadLetterId) -> EventLogResult<()> {
        let mut letters = self.letters.write().map_err(lock_error)?;
        let before = letters.len();
        letters.retain(|letter| letter.id() != id);
        if letters.len() == before {
            return Err(EventLogRepositoryError::DeadLetterNotFound(id));
        }
        Ok(())
    }
}
