//! Redis-backed remote store.
//!
//! Available with the `redis-tokio` or `redis-smol` features.

mod redis_remote_store;
pub use redis_remote_store::*;
