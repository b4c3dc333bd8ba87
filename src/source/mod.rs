//! Byte sources: where ring buffer snapshots come from.
//!
//! The capture loop only ever sees the [`ByteSource`] capability. Two adapters exist:
//!
//! - [`MappedSource`]: a physical memory range exported by the radio driver and mapped
//!   into this process. Reads may be torn because the driver keeps writing while we
//!   copy; this is accepted and not detected.
//! - [`DatagramSource`]: a UDP socket where each datagram carries exactly one chunk.
//!
//! Raw pointers never leave this module.

pub mod datagram;
pub mod mapped;

pub use datagram::DatagramSource;
pub use mapped::{MappedSource, MemInfo};

use crate::error::AppResult;

/// Capability: produce a fixed-size block of bytes on demand.
///
/// # Contract
/// - `snapshot` returns `Ok(None)` when no data was available this time (timeouts,
///   short receives). Callers keep polling.
/// - `Err` is reserved for failures the caller cannot recover from.
/// - The source never mutates the underlying region.
pub trait ByteSource: Send {
    /// Number of bytes each snapshot is expected to carry.
    fn expected_len(&self) -> usize;

    /// Copy out the current content, or `None` if nothing arrived.
    fn snapshot(&mut self) -> AppResult<Option<Vec<u8>>>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn expected_len(&self) -> usize {
        (**self).expected_len()
    }

    fn snapshot(&mut self) -> AppResult<Option<Vec<u8>>> {
        (**self).snapshot()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
