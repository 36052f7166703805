//! Cache module for storing weather responses under a TTL
//!
//! This module provides a typed `Cache` that serializes values to JSON and
//! stores them in a pluggable `CacheBackend`. Expiry is enforced by the
//! backend alone: a lookup either returns a live entry or nothing. Backend
//! failures are reported as `CacheError::Unavailable` and are never folded
//! into a miss, so callers can tell "not cached" from "cache is down".

mod backend;
mod manager;
mod memory;
mod redis_cache;

pub use backend::{CacheBackend, CacheError};
pub use manager::{Cache, DEFAULT_CACHE_TIMEOUT};
pub use memory::MemoryBackend;
pub use redis_cache::RedisBackend;
