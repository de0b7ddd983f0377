//! Small helpers shared across analyzers: CAS-loop peak tracking and stack
//! frame parsing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Updates `peak` to `max(peak, candidate)` via an explicit CAS loop, per
/// `spec.md` §5's "peaks use CAS loops".
pub fn atomic_max_u64(peak: &AtomicU64, candidate: u64) {
    let mut current = peak.load(Ordering::Relaxed);
    while candidate > current {
        match peak.compare_exchange_weak(
            current,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}

/// Same as [`atomic_max_u64`] but for `f64` peaks, stored as their bit
/// pattern since there is no `AtomicF64` in `std`.
pub fn atomic_max_f64(peak_bits: &AtomicU64, candidate: f64) {
    let mut current = peak_bits.load(Ordering::Relaxed);
    while candidate > f64::from_bits(current) {
        match peak_bits.compare_exchange_weak(
            current,
            candidate.to_bits(),
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}

/// A stable 16-hex-char digest of a stack string, used to key pinning
/// hotspots. Byte-identical stacks always hash to the same key.
#[must_use]
pub fn stack_digest(stack: &str) -> String {
    let mut hasher = DefaultHasher::new();
    stack.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Extracts the first `at <frame>` line of a Java-style stack trace, or
/// `"Unknown"` if none is found.
#[must_use]
pub fn top_frame(stack: &str) -> String {
    stack
        .lines()
        .find_map(|line| line.trim().strip_prefix("at "))
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Parses a stack trace into frames, stripping everything from the first
/// `(` onward (source-file/line info) and dropping lines that are not
/// `at ...` frames.
#[must_use]
pub fn parse_frames(stack: &str) -> Vec<String> {
    stack
        .lines()
        .filter_map(|line| line.trim().strip_prefix("at "))
        .map(|frame| match frame.find('(') {
            Some(idx) => frame[..idx].trim_end().to_string(),
            None => frame.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_stacks_hash_identically() {
        let a = "at a.X.m(1)\nat a.Y.n(2)";
        let b = "at a.X.m(1)\nat a.Y.n(2)";
        assert_eq!(stack_digest(a), stack_digest(b));
        assert_eq!(stack_digest(a).len(), 16);
    }

    #[test]
    fn top_frame_extracts_first_at_line() {
        assert_eq!(top_frame("at a.X.m(1)\nat a.Y.n(2)"), "a.X.m(1)");
        assert_eq!(top_frame("garbage"), "Unknown");
    }

    #[test]
    fn parse_frames_strips_source_info() {
        let frames = parse_frames("at a.X.m(File.java:1)\nat a.Y.n(File.java:2)");
        assert_eq!(frames, vec!["a.X.m", "a.Y.n"]);
    }
}
