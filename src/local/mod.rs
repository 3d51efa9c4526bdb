//! In-process remote store.
//!
//! [`LocalRemoteStore`] keeps shared totals in memory using thread-safe data
//! structures ([`DashMap`](dashmap::DashMap) and atomics).
//!
//! # When to Use
//!
//! ✅ **Use the local store when:**
//! - A single process owns the limits
//! - Testing pools and counters without a Redis server, including outages
//!
//! ❌ **Don't use it when:**
//! - Multiple application instances need shared limits
//!
//! # Examples
//!
//! ```ignore
//! use hitpool::{LocalRemoteStore, Pool, PoolOptions};
//!
//! let store = LocalRemoteStore::new();
//!
//! // Two pools on one store act like two instances sharing a remote counter.
//! let first = Pool::new(store.clone(), PoolOptions::default());
//! let second = Pool::new(store.clone(), PoolOptions::default());
//! ```

mod local_remote_store;
pub use local_remote_store::*;
