//! Periodic capture of a byte source into an append-only binary log.
//!
//! The log has no header and no framing: every successful poll appends the raw
//! snapshot verbatim, so a log of K snapshots is exactly K * S bytes long.
//!
//! # Cancellation
//!
//! The [`CancelToken`] is checked once at the top of every iteration. An append or
//! sleep that is already in progress finishes first, so shutdown takes at most one
//! interval plus one append.

use crate::config::CaptureConfig;
use crate::error::{AppResult, SweepError};
use crate::shutdown::CancelToken;
use crate::source::ByteSource;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How the capture loop reacts to a failed append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Stop capturing and return the error.
    #[default]
    FailFast,
    /// Log the failure, count it and keep capturing.
    ///
    /// A failed append may have written part of a snapshot, which misaligns every
    /// chunk after it in the log.
    BestEffort,
}

/// Counters reported when a capture ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Snapshots appended to the log.
    pub snapshots: u64,
    /// Bytes appended to the log.
    pub bytes: u64,
    /// Appends that failed under [`WritePolicy::BestEffort`].
    pub failed_appends: u64,
    /// Polls where the source had no data.
    pub empty_polls: u64,
}

/// Snapshots a [`ByteSource`] into a sink on a fixed interval.
pub struct DumpWriter<S, W = File> {
    source: S,
    sink: W,
    interval: Duration,
    policy: WritePolicy,
    max_snapshots: Option<u64>,
    stats: CaptureStats,
}

impl<S: ByteSource> DumpWriter<S, File> {
    /// Create (or truncate) the log file at `path`.
    pub fn create(source: S, path: &Path, config: &CaptureConfig) -> AppResult<Self> {
        let file = File::create(path).map_err(|e| SweepError::resource(path, e))?;
        info!(path = %path.display(), "Binary log opened");
        Ok(Self::new(source, file, config))
    }
}

impl<S: ByteSource, W: Write> DumpWriter<S, W> {
    /// Build a writer around an already opened sink.
    pub fn new(source: S, sink: W, config: &CaptureConfig) -> Self {
        Self {
            source,
            sink,
            interval: config.interval,
            policy: config.write_policy,
            max_snapshots: config.max_snapshots,
            stats: CaptureStats::default(),
        }
    }

    /// Override the pause between polls. Zero disables sleeping.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Poll until cancelled or the snapshot limit is reached.
    ///
    /// Consumes the writer; the source (and any mapping it holds) and the sink are
    /// released on return.
    pub fn run(mut self, cancel: &CancelToken) -> AppResult<CaptureStats> {
        info!(
            source = %self.source.describe(),
            interval = ?self.interval,
            policy = ?self.policy,
            "Capture started"
        );

        while !cancel.is_cancelled() && !self.limit_reached() {
            self.poll_once()?;

            if self.limit_reached() {
                break;
            }

            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        }

        if let Err(e) = self.sink.flush() {
            warn!(error = %e, "Final flush of binary log failed");
        }

        info!(
            snapshots = self.stats.snapshots,
            bytes = self.stats.bytes,
            failed_appends = self.stats.failed_appends,
            empty_polls = self.stats.empty_polls,
            "Capture stopped"
        );
        Ok(self.stats)
    }

    /// Take one snapshot and append it, applying the write policy on failure.
    pub fn poll_once(&mut self) -> AppResult<()> {
        let Some(bytes) = self.source.snapshot()? else {
            self.stats.empty_polls += 1;
            return Ok(());
        };

        let started = Instant::now();
        match self.append(&bytes) {
            Ok(()) => {
                self.stats.snapshots += 1;
                self.stats.bytes += bytes.len() as u64;
                debug!(
                    at = chrono::Utc::now().timestamp(),
                    len = bytes.len(),
                    took_us = started.elapsed().as_micros() as u64,
                    "Snapshot appended"
                );
                Ok(())
            }
            Err(err) => match self.policy {
                WritePolicy::FailFast => Err(err),
                WritePolicy::BestEffort => {
                    self.stats.failed_appends += 1;
                    warn!(error = %err, failed = self.stats.failed_appends, "Snapshot dropped");
                    Ok(())
                }
            },
        }
    }

    fn limit_reached(&self) -> bool {
        let reached = self
            .max_snapshots
            .is_some_and(|limit| self.stats.snapshots >= limit);
        if reached {
            debug!(limit = ?self.max_snapshots, "Snapshot limit reached");
        }
        reached
    }

    fn append(&mut self, bytes: &[u8]) -> AppResult<()> {
        self.sink
            .write_all(bytes)
            .and_then(|()| self.sink.flush())
            .map_err(SweepError::Append)
    }
}
