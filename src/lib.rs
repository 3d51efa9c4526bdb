#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub use error::*;

mod common;
pub use common::{AdmissionDecision, CounterKey, RemoteTimeoutMs, TtlSeconds};

mod remote;
pub use remote::*;

mod counter;
pub use counter::*;

mod pool;
pub use pool::*;

pub mod local;
pub use local::LocalRemoteStore;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
pub mod redis;

mod runtime;

#[cfg(test)]
mod tests;
