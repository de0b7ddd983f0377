//! Lock-free, single-producer, lossy-overwrite ring buffer.
//!
//! One [`Ring<T>`] backs one event family end to end: the ingestion engine's
//! event handler is the sole producer, the broadcaster's event tick is the
//! sole regular consumer. Under overload the oldest unread element is
//! silently overwritten; this is the documented, intentional loss semantic —
//! consumers must not assume contiguous sequence numbers survive.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// One buffer slot. `None` means empty or already drained.
struct Slot<T>(UnsafeCell<Option<T>>);

// SAFETY: access to a `Slot` is only ever performed through `Ring`'s
// `offer`/`poll`, which serialize writers via the single-producer contract
// and readers via a CAS on `read_seq`. The cell itself carries no invariant
// beyond "one in-flight accessor at a time per index", which those methods
// uphold.
unsafe impl<T: Send> Sync for Slot<T> {}

/// Fixed-capacity, power-of-two ring buffer with overwrite-on-full semantics.
///
/// # Memory ordering
///
/// - The producer stores the slot value, then publishes it with a `Release`
///   store to `write_seq`. This is the only thread that ever writes
///   `write_seq`, so the store itself can use a plain store rather than a
///   read-modify-write.
/// - `poll` loads `write_seq` with `Acquire` to synchronize-with that
///   release, guaranteeing the slot read that follows observes the
///   producer's write. It then reserves the slot via a `compare_exchange` on
///   `read_seq` *before* taking the value, so a losing racer never removes an
///   element another racer is about to claim.
/// - Sequence numbers are unbounded `u64` counters, not wrapped indices —
///   the slot index is `seq & mask`. This sidesteps ABA entirely; wraparound
///   of the counter itself is not reachable in practice.
pub struct Ring<T> {
    slots: Box<[Slot<T>]>,
    mask: u64,
    capacity: u64,
    write_seq: AtomicU64,
    read_seq: AtomicU64,
}

// SAFETY: `Ring` is shared across the producer and consumer threads by
// `Arc`; all interior mutability is mediated by the atomic sequence
// counters as documented above.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Creates a ring whose capacity is the next power of two `>= requested`.
    ///
    /// `requested == 0` yields a capacity of 1.
    #[must_use]
    pub fn new(requested: usize) -> Self {
        let capacity = requested.max(1).next_power_of_two();
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot(UnsafeCell::new(None)));
        Self {
            slots: slots.into_boxed_slice(),
            mask: (capacity - 1) as u64,
            capacity: capacity as u64,
            write_seq: AtomicU64::new(0),
            read_seq: AtomicU64::new(0),
        }
    }

    /// The buffer's capacity (always a power of two).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Unconditionally stores `value`, overwriting the oldest unread element
    /// if the buffer is full. Never blocks, never fails.
    ///
    /// Single-producer only: concurrent callers of `offer` on the same ring
    /// are not supported and will corrupt the sequence counter.
    pub fn offer(&self, value: T) {
        let seq = self.write_seq.load(Ordering::Relaxed);
        let idx = (seq & self.mask) as usize;
        // SAFETY: single-producer contract — no other thread writes this
        // slot concurrently. A concurrent `poll`/`take` only ever reads
        // through the same `UnsafeCell`, and the relaxed load/store pair
        // below publishes this write via `write_seq`'s `Release`.
        unsafe {
            *self.slots[idx].0.get() = Some(value);
        }
        self.write_seq.store(seq + 1, Ordering::Release);
    }

    /// Removes and returns the oldest unread element, if any.
    ///
    /// Returns `None` both when the buffer is logically empty and when a
    /// concurrent `poll` won the race to reserve the next slot — per
    /// contract this method never retries on CAS failure.
    pub fn poll(&self) -> Option<T> {
        let r = self.read_seq.load(Ordering::Relaxed);
        let w = self.write_seq.load(Ordering::Acquire);
        if r >= w {
            return None;
        }
        if self
            .read_seq
            .compare_exchange(r, r + 1, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }
        let idx = (r & self.mask) as usize;
        // SAFETY: this call reserved sequence number `r` via the CAS above;
        // no other `poll` can also hold a reservation for the same `r`.
        unsafe { (*self.slots[idx].0.get()).take() }
    }

    /// Repeatedly polls until empty, invoking `f` on each drained element.
    /// Returns the number of elements drained.
    pub fn drain(&self, mut f: impl FnMut(T)) -> usize {
        let mut count = 0;
        while let Some(value) = self.poll() {
            f(value);
            count += 1;
        }
        count
    }

    /// The number of unread elements, capped at `capacity`.
    #[must_use]
    pub fn size(&self) -> usize {
        let w = self.write_seq.load(Ordering::Acquire);
        let r = self.read_seq.load(Ordering::Acquire);
        w.wrapping_sub(r).min(self.capacity) as usize
    }

    /// Discards all unread elements by fast-forwarding the read cursor.
    pub fn clear(&self) {
        let w = self.write_seq.load(Ordering::Acquire);
        self.read_seq.store(w, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(Ring::<u32>::new(0).capacity(), 1);
        assert_eq!(Ring::<u32>::new(1).capacity(), 1);
        assert_eq!(Ring::<u32>::new(5).capacity(), 8);
        assert_eq!(Ring::<u32>::new(64).capacity(), 64);
        assert_eq!(Ring::<u32>::new(65).capacity(), 128);
    }

    #[test]
    fn drain_returns_elements_fifo() {
        let ring = Ring::new(8);
        for i in 0..5 {
            ring.offer(i);
        }
        let mut drained = Vec::new();
        ring.drain(|v| drained.push(v));
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn overwrite_on_full_keeps_newest_elements() {
        let ring = Ring::new(4);
        for i in 1..=6 {
            ring.offer(i);
        }
        let mut drained = Vec::new();
        ring.drain(|v| drained.push(v));
        assert_eq!(drained, vec![3, 4, 5, 6]);
    }

    #[test]
    fn size_reports_unread_count_capped_at_capacity() {
        let ring = Ring::new(4);
        assert_eq!(ring.size(), 0);
        for i in 0..10 {
            ring.offer(i);
        }
        assert_eq!(ring.size(), 4);
        ring.poll();
        assert_eq!(ring.size(), 3);
    }

    #[test]
    fn clear_empties_the_ring() {
        let ring = Ring::new(8);
        for i in 0..5 {
            ring.offer(i);
        }
        ring.clear();
        assert_eq!(ring.size(), 0);
        assert!(ring.poll().is_none());
    }

    #[test]
    fn poll_on_empty_ring_returns_none() {
        let ring = Ring::<u32>::new(4);
        assert!(ring.poll().is_none());
    }

    #[test]
    fn interleaved_offer_and_drain_preserves_order() {
        let ring = Ring::new(4);
        ring.offer(1);
        ring.offer(2);
        let mut out = Vec::new();
        ring.drain(|v| out.push(v));
        ring.offer(3);
        ring.offer(4);
        ring.drain(|v| out.push(v));
        assert_eq!(out, vec![1, 2, 3, 4]);
    }
}
