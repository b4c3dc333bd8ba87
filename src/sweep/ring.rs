//! Ring buffer snapshot view and traversal order.
//!
//! A snapshot (one "chunk") is the raw content of the hardware sweep ring:
//!
//! ```text
//! [cur_pos: u32 LE] [record 0] [record 1] ... [record N-1]
//! ```
//!
//! `cur_pos` marks the slot where logical traversal starts. Slots are visited
//! `cur_pos, cur_pos + 1, ..., wrapping modulo N`.
//!
//! Whether `cur_pos` is the oldest valid record or the next slot the producer will
//! overwrite has not been confirmed against the producer. Both readings yield the same
//! visiting order when the ring is full, which is the only case the capture path sees.

use crate::error::{AppResult, SweepError};
use crate::sweep::codec::{SweepRecord, RECORD_LEN};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// Size of the cursor field at the start of each chunk.
pub const CURSOR_LEN: usize = 4;

/// Number of record slots in the default hardware ring.
pub const DEFAULT_CAPACITY: usize = 256;

/// Largest accepted ring, keeping S well inside `usize` on every target.
pub const MAX_CAPACITY: usize = 1 << 20;

/// Out-of-band agreement on the ring geometry shared by writer and reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingLayout {
    /// Number of record slots (N).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for RingLayout {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl RingLayout {
    /// Layout with `capacity` record slots.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Serialized snapshot size S = cursor + N records.
    ///
    /// Saturates instead of wrapping; [`RingLayout::validate`] rejects any layout
    /// large enough for that to matter.
    pub fn chunk_len(&self) -> usize {
        self.capacity
            .saturating_mul(RECORD_LEN)
            .saturating_add(CURSOR_LEN)
    }

    /// Reject empty rings and rings above [`MAX_CAPACITY`].
    pub fn validate(&self) -> AppResult<()> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(SweepError::Config(format!(
                "layout.capacity must be between 1 and {MAX_CAPACITY}, got {}",
                self.capacity
            )));
        }
        Ok(())
    }
}

/// Logical (oldest-first) visiting order of ring slots.
///
/// Yields `(start + i) % capacity` for `i` in `0..capacity`. Once exhausted it stays
/// exhausted; build a new one to walk the ring again.
#[derive(Debug, Clone)]
pub struct RingTraversal {
    capacity: usize,
    start: usize,
    step: usize,
}

impl RingTraversal {
    /// Traversal of a ring with `capacity` slots beginning at `cursor`.
    ///
    /// A cursor at or beyond `capacity` is reduced modulo `capacity`.
    pub fn new(capacity: usize, cursor: usize) -> Self {
        let start = if capacity == 0 { 0 } else { cursor % capacity };
        Self {
            capacity,
            start,
            step: 0,
        }
    }
}

impl Iterator for RingTraversal {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.step >= self.capacity {
            return None;
        }
        let slot = (self.start + self.step) % self.capacity;
        self.step += 1;
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.capacity - self.step;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RingTraversal {}

impl FusedIterator for RingTraversal {}

/// A materialized copy of one ring buffer snapshot.
#[derive(Debug, Clone)]
pub struct SweepSnapshot {
    layout: RingLayout,
    bytes: Vec<u8>,
}

impl SweepSnapshot {
    /// Wrap raw chunk bytes, rejecting anything shorter than `layout.chunk_len()`.
    ///
    /// Extra trailing bytes are dropped.
    pub fn parse(mut bytes: Vec<u8>, layout: RingLayout) -> AppResult<Self> {
        let expected = layout.chunk_len();
        if bytes.len() < expected {
            return Err(SweepError::TruncatedChunk {
                expected,
                actual: bytes.len(),
            });
        }
        bytes.truncate(expected);
        Ok(Self { layout, bytes })
    }

    /// Ring geometry this snapshot was parsed with.
    pub fn layout(&self) -> RingLayout {
        self.layout
    }

    /// Raw `cur_pos` as stored by the producer.
    pub fn cursor(&self) -> u32 {
        let mut raw = [0u8; CURSOR_LEN];
        raw.copy_from_slice(&self.bytes[..CURSOR_LEN]);
        u32::from_le_bytes(raw)
    }

    /// Raw bytes of the record in slot `slot`.
    pub fn slot(&self, slot: usize) -> Option<&[u8]> {
        if slot >= self.layout.capacity {
            return None;
        }
        let start = CURSOR_LEN + slot * RECORD_LEN;
        self.bytes.get(start..start + RECORD_LEN)
    }

    /// Slot indices in logical order.
    pub fn traversal(&self) -> RingTraversal {
        RingTraversal::new(self.layout.capacity, self.cursor() as usize)
    }

    /// Decoded records in logical order.
    pub fn records(&self) -> impl Iterator<Item = SweepRecord> + '_ {
        self.traversal()
            .filter_map(move |slot| self.slot(slot))
            .filter_map(|raw| SweepRecord::decode(raw).ok())
    }

    /// Build a snapshot from records laid out in slot order plus a cursor.
    ///
    /// Missing slots are zero-filled; surplus records are ignored.
    pub fn from_records(layout: RingLayout, cursor: u32, records: &[SweepRecord]) -> Self {
        let mut bytes = vec![0u8; layout.chunk_len()];
        bytes[..CURSOR_LEN].copy_from_slice(&cursor.to_le_bytes());
        for (slot, record) in records.iter().take(layout.capacity).enumerate() {
            let start = CURSOR_LEN + slot * RECORD_LEN;
            bytes[start..start + RECORD_LEN].copy_from_slice(&record.encode());
        }
        Self { layout, bytes }
    }

    /// The serialized chunk.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the serialized chunk.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::codec::{MacAddress, SectorSweep, Snr};

    fn record(ctr: u32) -> SweepRecord {
        SweepRecord {
            ctr,
            src: MacAddress([0, 1, 2, 3, 4, ctr as u8]),
            sweep: SectorSweep::new(0, ctr as u16, ctr as u8).unwrap(),
            snr: Snr(ctr as u8),
            dmg_tmstmp: u64::from(ctr) * 1000,
        }
    }

    #[test]
    fn test_traversal_from_zero() {
        let order: Vec<_> = RingTraversal::new(5, 0).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_traversal_wraps() {
        let order: Vec<_> = RingTraversal::new(5, 3).collect();
        assert_eq!(order, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_traversal_exhausts() {
        let mut traversal = RingTraversal::new(3, 1);
        assert_eq!(traversal.len(), 3);
        assert_eq!(traversal.by_ref().count(), 3);
        assert_eq!(traversal.next(), None);
        assert_eq!(traversal.len(), 0);
    }

    #[test]
    fn test_traversal_empty_ring() {
        assert_eq!(RingTraversal::new(0, 7).count(), 0);
    }

    #[test]
    fn test_traversal_cursor_out_of_range() {
        let order: Vec<_> = RingTraversal::new(4, 6).collect();
        assert_eq!(order, vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_chunk_len() {
        assert_eq!(RingLayout::default().chunk_len(), 4 + 256 * 24);
        assert_eq!(RingLayout::new(5).chunk_len(), 124);
    }

    #[test]
    fn test_huge_capacity_does_not_wrap() {
        let layout = RingLayout::new(usize::MAX / RECORD_LEN + 1);
        assert_eq!(layout.chunk_len(), usize::MAX);
        assert!(matches!(layout.validate(), Err(SweepError::Config(_))));

        assert!(RingLayout::new(MAX_CAPACITY).validate().is_ok());
        assert!(RingLayout::new(MAX_CAPACITY + 1).validate().is_err());
        assert!(RingLayout::new(0).validate().is_err());
    }

    #[test]
    fn test_parse_rejects_short_chunk() {
        let layout = RingLayout::new(2);
        let err = SweepSnapshot::parse(vec![0u8; layout.chunk_len() - 1], layout).unwrap_err();
        assert!(matches!(err, SweepError::TruncatedChunk { expected: 52, actual: 51 }));
    }

    #[test]
    fn test_parse_truncates_long_chunk() {
        let layout = RingLayout::new(2);
        let snapshot = SweepSnapshot::parse(vec![0u8; 100], layout).unwrap();
        assert_eq!(snapshot.as_bytes().len(), layout.chunk_len());
    }

    #[test]
    fn test_records_follow_cursor() {
        let layout = RingLayout::new(5);
        let records: Vec<_> = (0..5).map(record).collect();
        let snapshot = SweepSnapshot::from_records(layout, 3, &records);

        assert_eq!(snapshot.cursor(), 3);
        let ctrs: Vec<_> = snapshot.records().map(|r| r.ctr).collect();
        assert_eq!(ctrs, vec![3, 4, 0, 1, 2]);

        let reparsed = SweepSnapshot::parse(snapshot.clone().into_bytes(), layout).unwrap();
        let decoded: Vec<_> = reparsed.records().collect();
        assert_eq!(decoded[0], records[3]);
        assert_eq!(decoded[4], records[2]);
    }
}
