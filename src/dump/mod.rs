//! Binary log capture and decode.
pub mod reader;
pub mod writer;

pub use reader::{decode, decode_file, DecodeStats, DumpReader};
pub use writer::{CaptureStats, DumpWriter, WritePolicy};
