//! Sector sweep data format: record codec, ring traversal and text rendering.
pub mod codec;
pub mod format;
pub mod ring;

pub use codec::{MacAddress, SectorSweep, Snr, SweepRecord, RECORD_LEN};
pub use format::{CsvFormatter, JsonLinesFormatter, RecordFormatter, CSV_HEADER};
pub use ring::{RingLayout, RingTraversal, SweepSnapshot, MAX_CAPACITY};
