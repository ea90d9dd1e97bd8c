//! Thread-safe in-memory priority repository.

mod repository;

pub use repository::InMemoryPriorityRepository;
