//! Thread-safe in-memory task repository.

mod repository;

pub use repository::InMemoryTaskRepository;
