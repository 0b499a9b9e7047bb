//! Cache store backends.

pub mod memory;
pub mod redis_impl;

pub use memory::MemoryCache;
pub use redis_impl::RedisCache;
