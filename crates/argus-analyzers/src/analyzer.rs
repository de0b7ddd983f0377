//! The capability shared by every analyzer.

use serde::Serialize;

/// A pure, bounded-memory aggregator over one event family.
///
/// Implementations must be safe to call `record` and `get_analysis`
/// concurrently: the broadcaster's event tick calls `record` from its own
/// thread while HTTP handlers call `get_analysis` from arbitrary request
/// threads. No analyzer calls into another (`spec.md` §5).
pub trait Analyzer {
    type Event;
    type Analysis: Serialize;

    fn record(&self, event: &Self::Event);
    fn get_analysis(&self) -> Self::Analysis;
}
