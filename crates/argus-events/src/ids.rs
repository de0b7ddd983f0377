//! Identifier newtypes shared across event families.

use std::fmt;

/// A virtual-thread identifier, stable for the lifetime of the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A carrier (OS) thread identifier. `-1` means unknown, matching
/// `spec.md`'s `carrier_thread_id? (−1 = unknown)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CarrierId(pub i64);

impl CarrierId {
    pub const UNKNOWN: CarrierId = CarrierId(-1);

    #[must_use]
    pub fn is_known(self) -> bool {
        self.0 >= 0
    }

    #[must_use]
    pub fn as_known(self) -> Option<u64> {
        self.is_known().then_some(self.0 as u64)
    }
}

impl Default for CarrierId {
    fn default() -> Self {
        CarrierId::UNKNOWN
    }
}
