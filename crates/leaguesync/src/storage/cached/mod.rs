//! Cache-aside repository decorator.

mod repository;

pub use repository::CachedRepository;
