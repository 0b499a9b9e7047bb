//! Core library for the leaguesync project.
//!
//! Holds the domain types, the trait seams for the cache store, the
//! relational repository and the upstream client, and the fan-out sync
//! engine. Backend implementations (SQLite, Redis, HTTP) live in the
//! `leaguesync` binary crate.

pub mod cache;
pub mod record;
pub mod storage;
pub mod sync;
pub mod upstream;
