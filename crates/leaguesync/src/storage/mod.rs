//! Repository backends.

pub mod cached;
pub mod inmemory;
pub mod sqlite;

pub use cached::CachedRepository;
pub use inmemory::InMemoryRepository;
pub use sqlite::SqliteRepository;
