//! Redis cache backend.
//!
//! Record sets are stored as Redis hashes keyed by natural-key rendering,
//! with TTL and tracking-set based pattern deletion.

mod cache;
mod error;

pub use cache::RedisCache;
