use std::{fmt, ops::Deref, sync::Arc, time::Duration};

use crate::HitpoolError;

/// Outcome of a single-counter admission check.
#[derive(Debug)]
pub enum AdmissionDecision {
    /// The hit was admitted and counted.
    Allowed,
    /// The hit was admitted and counted, but it landed exactly on the limit and
    /// the reconciliation it triggered failed.
    ///
    /// Local bookkeeping stays consistent; the unmerged hits are pushed on the
    /// next successful sync. Callers usually treat this as allowed and log the error.
    AllowedUnsynced {
        /// Error returned by the remote store during reconciliation.
        error: HitpoolError,
    },
    /// The hit was rejected and not counted.
    Rejected,
}

impl AdmissionDecision {
    /// Whether the hit was admitted, regardless of the reconciliation outcome.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, AdmissionDecision::Rejected)
    }
}

/// A validated prefix for remote counter names.
///
/// This is a string with the following constraints:
/// - Must not be empty
/// - Must not be longer than 255 bytes
/// - Must not contain colons (the separator between prefix and key)
///
/// Resource keys are not restricted this way: any non-empty key, colons included,
/// is appended after the separator.
#[derive(Debug, Clone, PartialEq, PartialOrd, Hash, Eq)]
pub struct CounterKey(Arc<str>);

impl CounterKey {
    /// The prefix used when [`PoolOptions::prefix`](crate::PoolOptions::prefix) is `None`.
    pub fn default_prefix() -> Self {
        Self(Arc::from("hitpool"))
    }

    /// Remote name for `key` under this prefix: `<prefix>:<key>`.
    pub fn qualify(&self, key: &str) -> String {
        format!("{}:{}", self.0, key)
    }
}

impl Deref for CounterKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CounterKey {
    type Error = HitpoolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(HitpoolError::InvalidCounterKey(
                "counter key must not be empty".to_string(),
            ))
        } else if value.len() > 255 {
            Err(HitpoolError::InvalidCounterKey(
                "counter key must not be longer than 255 bytes".to_string(),
            ))
        } else if value.contains(':') {
            Err(HitpoolError::InvalidCounterKey(
                "counter key must not contain colons".to_string(),
            ))
        } else {
            Ok(Self(Arc::from(value)))
        }
    }
}

impl TryFrom<String> for CounterKey {
    type Error = HitpoolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Expiry hint attached to a remote counter, refreshed on every increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TtlSeconds(u64);

impl Default for TtlSeconds {
    /// One hour.
    fn default() -> Self {
        Self(3600)
    }
}

impl TtlSeconds {
    /// The hint as a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Deref for TtlSeconds {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u64> for TtlSeconds {
    type Error = HitpoolError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(HitpoolError::InvalidTtlSeconds(
                "ttl must be at least 1 second".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }
}

/// Upper bound on a single remote call made during reconciliation or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RemoteTimeoutMs(u64);

impl RemoteTimeoutMs {
    /// The timeout as a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Deref for RemoteTimeoutMs {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u64> for RemoteTimeoutMs {
    type Error = HitpoolError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(HitpoolError::InvalidRemoteTimeoutMs(
                "remote timeout must be greater than 0".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }
}
