//! # Sweeper Core Library
//!
//! Captures snapshots of a radio's sector sweep ring buffer into an append-only binary
//! log and decodes such logs into a time-ordered text stream.
//!
//! ## Crate Structure
//!
//! - **`sweep`**: the data format. `codec` packs and unpacks one record, `ring` walks
//!   the ring slots in logical order, `format` renders records as text.
//! - **`source`**: the `ByteSource` capability and its two adapters (mapped physical
//!   memory, UDP datagrams).
//! - **`dump`**: `DumpWriter` (periodic capture into the binary log) and `DumpReader`
//!   (chunked reading of the log plus the decode driver).
//! - **`shutdown`**: the cancellation token polled by the capture loop.
//! - **`config`**: layered settings via `figment`.
//! - **`logging`**: `tracing-subscriber` setup.
//! - **`error`**: the crate-wide `SweepError`.
//!
//! ## Pipeline
//!
//! ```text
//! capture: ByteSource --snapshot--> DumpWriter --append--> binary log
//! decode:  binary log --chunk--> DumpReader --> RingTraversal + codec --> formatter
//! ```

pub mod config;
pub mod dump;
pub mod error;
pub mod logging;
pub mod shutdown;
pub mod source;
pub mod sweep;

pub use error::{AppResult, SweepError};
