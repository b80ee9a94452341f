//! Expiration timestamps for cached contributions.
//!
//! A contribution is valid until an absolute UTC instant, or forever for
//! sources whose content cannot change out-of-band. The federated view of
//! a node is only as fresh as its least-fresh contribution, so expirations
//! combine by taking the earliest.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// An absolute instant, stored as milliseconds since the Unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp at the current time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis() as u64;
        Self(millis)
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns this timestamp shifted forward by `millis`.
    #[must_use]
    pub const fn plus_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// When a cached contribution stops being valid.
///
/// `Never` marks a contribution as cache-policy-exempt: its source has
/// guaranteed the content cannot change out-of-band, so it is never
/// re-fetched. For ordering purposes `Never` compares as later than any
/// concrete instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expiration {
    /// The contribution never expires.
    Never,
    /// The contribution expires at the given instant.
    At(Timestamp),
}

impl Expiration {
    /// Returns true iff a concrete deadline is set and `now` has reached it.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        match self {
            Self::Never => false,
            Self::At(deadline) => now >= *deadline,
        }
    }

    /// Combines two expirations, keeping the earlier deadline.
    ///
    /// `Never` acts as positive infinity: the result is `Never` only when
    /// both inputs are.
    #[must_use]
    pub fn earliest(self, other: Self) -> Self {
        match (self, other) {
            (Self::Never, other) => other,
            (this, Self::Never) => this,
            (Self::At(a), Self::At(b)) => Self::At(a.min(b)),
        }
    }

    /// Returns the concrete deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Timestamp> {
        match self {
            Self::Never => None,
            Self::At(deadline) => Some(*deadline),
        }
    }
}

impl Default for Expiration {
    fn default() -> Self {
        Self::Never
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::At(deadline) => write!(f, "{deadline}"),
        }
    }
}

impl PartialOrd for Expiration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expiration {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Never, Self::Never) => Ordering::Equal,
            (Self::Never, Self::At(_)) => Ordering::Greater,
            (Self::At(_), Self::Never) => Ordering::Less,
            (Self::At(a), Self::At(b)) => a.cmp(b),
        }
    }
}
