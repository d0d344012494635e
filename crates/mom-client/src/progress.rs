//! Upload progress and telemetry
//!
//! Speed is a cumulative average (all bytes over all chunk time), not an
//! instantaneous rate. One log line is emitted for every whole percent
//! crossed, so coarse chunks never leave holes in the trail.

use crate::slicer::ChunkRange;
use std::fmt;
use std::time::Duration;
use tracing::info;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Estimated time remaining
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eta {
    pub minutes: u64,
    pub seconds: u64,
}

impl Eta {
    pub fn from_secs(total: u64) -> Self {
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m {:02}s", self.minutes, self.seconds)
    }
}

/// Snapshot published after each acknowledged chunk
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    /// Whole percent, 0..=100
    pub percent: u8,
    /// Bytes acknowledged so far
    pub uploaded_bytes: u64,
    /// File size
    pub total_bytes: u64,
    /// Chunk that produced this update
    pub chunk_index: usize,
    /// Number of chunks
    pub total_chunks: usize,
    /// Cumulative average speed in MB/s
    pub speed_mbps: f64,
    /// Remaining time at the current average speed
    pub eta: Option<Eta>,
}

/// One entry of the per-percent audit trail
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressLine {
    pub percent: u8,
    pub speed_mbps: f64,
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uploaded {}% ({:.2} MB/s)", self.percent, self.speed_mbps)
    }
}

/// Accumulates acknowledged bytes and chunk timings for one job
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    total_bytes: u64,
    uploaded_bytes: u64,
    chunk_timings: Vec<Duration>,
    percent: u8,
    log: Vec<ProgressLine>,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            uploaded_bytes: 0,
            chunk_timings: Vec::new(),
            percent: 0,
            log: Vec::new(),
        }
    }

    /// Account for one acknowledged chunk.
    ///
    /// Percent is held below 100 here; only [`complete`](Self::complete)
    /// can publish 100.
    pub fn record_chunk(&mut self, chunk: &ChunkRange, elapsed: Duration) -> ProgressUpdate {
        self.chunk_timings.push(elapsed);
        self.uploaded_bytes = (self.uploaded_bytes + chunk.len()).min(self.total_bytes);

        let target = self.raw_percent().min(99);
        self.advance_to(target);
        self.snapshot(chunk)
    }

    /// Publish completion once the server returned the final URL.
    ///
    /// Percent reaches 100 only if every byte was acknowledged.
    pub fn complete(&mut self, chunk: &ChunkRange) -> ProgressUpdate {
        if self.uploaded_bytes == self.total_bytes {
            self.advance_to(100);
        }
        self.snapshot(chunk)
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn chunk_timings(&self) -> &[Duration] {
        &self.chunk_timings
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Every per-percent line emitted so far
    pub fn log(&self) -> &[ProgressLine] {
        &self.log
    }

    /// Cumulative average speed in MB/s, zero until time has been measured
    pub fn speed_mbps(&self) -> f64 {
        let secs: f64 = self.chunk_timings.iter().map(Duration::as_secs_f64).sum();
        if secs > 0.0 {
            self.uploaded_bytes as f64 / BYTES_PER_MB / secs
        } else {
            0.0
        }
    }

    /// Remaining time at the average speed
    pub fn eta(&self) -> Option<Eta> {
        let speed = self.speed_mbps();
        if speed <= 0.0 {
            return None;
        }
        let remaining_mb = (self.total_bytes - self.uploaded_bytes) as f64 / BYTES_PER_MB;
        Some(Eta::from_secs((remaining_mb / speed).round() as u64))
    }

    fn raw_percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = (self.uploaded_bytes as f64 / self.total_bytes as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    fn advance_to(&mut self, target: u8) {
        if target <= self.percent {
            return;
        }
        let speed_mbps = self.speed_mbps();
        for percent in (self.percent + 1)..=target {
            let line = ProgressLine { percent, speed_mbps };
            info!("{}", line);
            self.log.push(line);
        }
        self.percent = target;
    }

    fn snapshot(&self, chunk: &ChunkRange) -> ProgressUpdate {
        ProgressUpdate {
            percent: self.percent,
            uploaded_bytes: self.uploaded_bytes,
            total_bytes: self.total_bytes,
            chunk_index: chunk.index,
            total_chunks: chunk.total,
            speed_mbps: self.speed_mbps(),
            eta: self.eta(),
        }
    }
}
