//! Sequential reader for binary sweep dump logs, and the decode driver.
//!
//! The log is read in chunks of exactly `layout.chunk_len()` bytes. A short read at
//! the end means the capture was interrupted mid-append; the fragment is discarded
//! and reading stops without error.

use crate::error::{AppResult, SweepError};
use crate::sweep::{RecordFormatter, RingLayout, SweepSnapshot};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Iterator over the full chunks of a binary log.
pub struct DumpReader<R> {
    inner: R,
    layout: RingLayout,
    chunks: u64,
    discarded: usize,
    done: bool,
}

impl DumpReader<BufReader<File>> {
    /// Open the log at `path`.
    pub fn open(path: &Path, layout: RingLayout) -> AppResult<Self> {
        let file = File::open(path).map_err(|e| SweepError::resource(path, e))?;
        Ok(Self::new(BufReader::new(file), layout))
    }
}

impl<R: Read> DumpReader<R> {
    /// Read chunks laid out per `layout` from `inner`.
    pub fn new(inner: R, layout: RingLayout) -> Self {
        Self {
            inner,
            layout,
            chunks: 0,
            discarded: 0,
            done: false,
        }
    }

    /// Full chunks yielded so far.
    pub fn chunks_read(&self) -> u64 {
        self.chunks
    }

    /// Size of the trailing fragment dropped at end of log, if any.
    pub fn discarded_bytes(&self) -> usize {
        self.discarded
    }

    /// Read the next full chunk, or `None` at end of data.
    fn read_chunk(&mut self) -> AppResult<Option<Vec<u8>>> {
        let mut chunk = vec![0u8; self.layout.chunk_len()];
        let mut filled = 0;

        while filled < chunk.len() {
            match self.inner.read(&mut chunk[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < chunk.len() {
            if filled > 0 {
                debug!(bytes = filled, "Discarding trailing partial chunk");
                self.discarded = filled;
            }
            return Ok(None);
        }

        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for DumpReader<R> {
    type Item = AppResult<SweepSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_chunk() {
            Ok(Some(chunk)) => {
                self.chunks += 1;
                Some(SweepSnapshot::parse(chunk, self.layout))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Counters reported when a decode run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Full chunks decoded.
    pub chunks: u64,
    /// Records emitted.
    pub records: u64,
    /// Bytes of a trailing partial chunk that were dropped.
    pub discarded_bytes: usize,
}

/// Decode every chunk from `reader` and render its records in ring order.
///
/// The formatter header is written once, before the first record.
pub fn decode<R: Read>(
    mut reader: DumpReader<R>,
    formatter: &mut dyn RecordFormatter,
    out: &mut dyn Write,
) -> AppResult<DecodeStats> {
    formatter.write_header(out)?;

    let mut stats = DecodeStats::default();
    for snapshot in reader.by_ref() {
        let snapshot = snapshot?;
        for record in snapshot.records() {
            formatter.write_record(out, &record)?;
            stats.records += 1;
        }
    }
    out.flush()?;

    stats.chunks = reader.chunks_read();
    stats.discarded_bytes = reader.discarded_bytes();
    info!(
        chunks = stats.chunks,
        records = stats.records,
        discarded_bytes = stats.discarded_bytes,
        "Decode finished"
    );
    Ok(stats)
}

/// Open the log at `path` and [`decode`] it.
pub fn decode_file(
    path: &Path,
    layout: RingLayout,
    formatter: &mut dyn RecordFormatter,
    out: &mut dyn Write,
) -> AppResult<DecodeStats> {
    decode(DumpReader::open(path, layout)?, formatter, out)
}
