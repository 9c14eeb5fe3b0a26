//! Component identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable, opaque identifier for one live component instance.
///
/// Identifiers come from a process-wide atomic counter, so they are never
/// reused while the process runs, no matter how many registries exist. On the
/// wire they look like `c42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw counter value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// The wire form could not be parsed back into an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidComponentId;

impl FromStr for ComponentId {
    type Err = InvalidComponentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('c').ok_or(InvalidComponentId)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidComponentId);
        }
        digits.parse().map(Self).map_err(|_| InvalidComponentId)
    }
}
