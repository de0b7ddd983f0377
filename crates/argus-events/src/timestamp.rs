//! Monotonic timestamps with a lazily-captured wall-clock origin.
//!
//! Internal event bookkeeping (durations, correlation windows) uses the
//! monotonic nanosecond counter exclusively; the wall-clock mapping exists
//! only to produce the ISO-8601 string the wire format requires.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime};

static ORIGIN: OnceLock<(Instant, SystemTime)> = OnceLock::new();

fn origin() -> &'static (Instant, SystemTime) {
    ORIGIN.get_or_init(|| (Instant::now(), SystemTime::now()))
}

/// A monotonic instant, nanosecond resolution, relative to a process-wide
/// origin captured on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Captures the current instant.
    #[must_use]
    pub fn now() -> Self {
        let (mono, _) = origin();
        Timestamp(mono.elapsed().as_nanos() as u64)
    }

    /// Builds a timestamp from a raw monotonic nanosecond offset, e.g. one
    /// extracted from a host-provided record. Ensures all ingestion-sourced
    /// timestamps share the same origin as `now()`.
    #[must_use]
    pub fn from_nanos_since_origin(nanos: u64) -> Self {
        Timestamp(nanos)
    }

    /// Raw nanosecond offset from the shared origin.
    #[must_use]
    pub fn raw_nanos(self) -> u64 {
        self.0
    }

    /// Signed nanosecond duration `self - earlier`, per `spec.md`'s signed
    /// 64-bit duration convention.
    #[must_use]
    pub fn nanos_since(self, earlier: Timestamp) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }

    /// Wall-clock `SystemTime` this timestamp corresponds to, for
    /// serialization only.
    #[must_use]
    pub fn to_wall_time(self) -> SystemTime {
        let (_, wall) = origin();
        *wall + std::time::Duration::from_nanos(self.0)
    }

    /// ISO-8601 string with nanosecond precision, as required by the wire
    /// event format.
    #[must_use]
    pub fn to_iso8601_nanos(self) -> String {
        let dt: chrono::DateTime<chrono::Utc> = self.to_wall_time().into();
        dt.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_reflects_elapsed_nanos() {
        let a = Timestamp::from_nanos_since_origin(1_000_000_000);
        let b = Timestamp::from_nanos_since_origin(1_200_000_000);
        assert_eq!(b.nanos_since(a), 200_000_000);
        assert_eq!(a.nanos_since(b), -200_000_000);
    }

    #[test]
    fn iso8601_round_trips_through_chrono() {
        let t = Timestamp::from_nanos_since_origin(0);
        let s = t.to_iso8601_nanos();
        assert!(chrono::DateTime::parse_from_rfc3339(&s).is_ok());
    }
}
