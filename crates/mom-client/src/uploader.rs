//! Chunked upload orchestration
//!
//! Chunks go out strictly one at a time in index order: chunk `i + 1` is
//! never sent before chunk `i` was acknowledged or the job ended. The server
//! is authoritative about completion; the first acknowledgement that carries
//! a final URL ends the job, whatever its index.

use crate::{
    ClientError, Config, Result, UploadFile,
    progress::{ProgressCallback, ProgressLine, ProgressTracker, ProgressUpdate},
    retry::RetryPolicy,
    slicer::{self, ChunkRange},
    transmitter::{ChunkRequest, ChunkTransmitter},
    types::{UploadMethod, UploadOutcome, UploadStatus},
};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// State of one file transfer
///
/// Partial progress stays readable after a failure; a job is never resumed.
#[derive(Debug)]
pub struct UploadJob {
    file: UploadFile,
    chunk_size: u64,
    pause_threshold: u64,
    pause_duration: Duration,
    total_chunks: usize,
    status: UploadStatus,
    final_url: Option<String>,
    progress: ProgressTracker,
    cooldowns: Vec<usize>,
    last_error: Option<String>,
}

impl UploadJob {
    pub fn file(&self) -> &UploadFile {
        &self.file
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    /// Server-assigned URL, set once on success
    pub fn final_url(&self) -> Option<&str> {
        self.final_url.as_deref()
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.progress.uploaded_bytes()
    }

    pub fn chunk_timings(&self) -> &[Duration] {
        self.progress.chunk_timings()
    }

    pub fn percent(&self) -> u8 {
        self.progress.percent()
    }

    pub fn progress_log(&self) -> &[ProgressLine] {
        self.progress.log()
    }

    /// Indices of chunks followed by a cooldown pause
    pub fn cooldowns(&self) -> &[usize] {
        &self.cooldowns
    }

    /// Message of the error that ended the job
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn should_cool_down(&self, chunk: &ChunkRange) -> bool {
        !chunk.is_last() && self.uploaded_bytes() % self.pause_threshold < self.chunk_size
    }
}

/// Drives an [`UploadJob`] through a [`ChunkTransmitter`]
pub struct ChunkedUploader<T> {
    transmitter: T,
    retry: RetryPolicy,
    chunk_size: u64,
    pause_threshold: u64,
    pause_duration: Duration,
    progress: Option<ProgressCallback>,
}

impl<T: ChunkTransmitter> ChunkedUploader<T> {
    /// Create an uploader; fails on an unusable configuration
    pub fn new(transmitter: T, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transmitter,
            retry: RetryPolicy::from_config(config),
            chunk_size: config.chunk_size,
            pause_threshold: config.pause_threshold,
            pause_duration: config.pause_duration,
            progress: None,
        })
    }

    /// Receive a [`ProgressUpdate`] after each acknowledged chunk
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Create an idle job for `file`
    pub fn new_job(&self, file: UploadFile) -> UploadJob {
        let total_chunks = slicer::total_chunks(file.size(), self.chunk_size);
        let progress = ProgressTracker::new(file.size());
        UploadJob {
            file,
            chunk_size: self.chunk_size,
            pause_threshold: self.pause_threshold,
            pause_duration: self.pause_duration,
            total_chunks,
            status: UploadStatus::Idle,
            final_url: None,
            progress,
            cooldowns: Vec::new(),
            last_error: None,
        }
    }

    /// Upload `file` in a fresh job
    pub async fn upload(&self, file: UploadFile, cancel: &CancellationToken) -> Result<UploadOutcome> {
        let mut job = self.new_job(file);
        let final_url = self.run(&mut job, cancel).await?;
        Ok(UploadOutcome {
            final_url,
            uploaded_bytes: job.uploaded_bytes(),
            total_chunks: job.total_chunks(),
            chunk_timings: job.chunk_timings().to_vec(),
            method: UploadMethod::Chunked,
        })
    }

    /// Run an idle job to a terminal state and return the final URL
    #[instrument(skip(self, job, cancel), fields(file = %job.file.name(), size = job.file.size()))]
    pub async fn run(&self, job: &mut UploadJob, cancel: &CancellationToken) -> Result<String> {
        if job.status != UploadStatus::Idle {
            return Err(ClientError::JobFinished);
        }
        job.status = UploadStatus::Uploading;

        let result = self.drive(job, cancel).await;
        match &result {
            Ok(url) => {
                job.status = UploadStatus::Succeeded;
                info!("Upload of {} complete: {}", job.file.name(), url);
            }
            Err(err) if err.is_cancelled() => {
                job.status = UploadStatus::Cancelled;
                job.last_error = Some(err.to_string());
                warn!("Upload of {} cancelled at {}%", job.file.name(), job.percent());
            }
            Err(err) => {
                job.status = UploadStatus::Failed;
                job.last_error = Some(err.to_string());
                error!("Upload of {} failed at {}%: {}", job.file.name(), job.percent(), err);
            }
        }
        result
    }

    async fn drive(&self, job: &mut UploadJob, cancel: &CancellationToken) -> Result<String> {
        let ranges = slicer::slice(job.file.size(), job.chunk_size);
        let total_chunks = ranges.len();
        info!(
            "Uploading {} ({} bytes) in {} chunk(s) of {} bytes",
            job.file.name(),
            job.file.size(),
            total_chunks,
            job.chunk_size
        );

        for chunk in &ranges {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled { chunk_index: chunk.index });
            }

            let data = job.file.read_range(chunk.range.clone()).await?;
            let filename = job.file.name();

            let (ack, elapsed) = self
                .retry
                .run(chunk.index, cancel, |_attempt| {
                    let request = self.transmitter.send_chunk(ChunkRequest {
                        index: chunk.index,
                        total_chunks,
                        filename,
                        data: data.clone(),
                    });
                    async move {
                        let started = Instant::now();
                        let ack = request.await?;
                        Ok((ack, started.elapsed()))
                    }
                })
                .await?;

            let update = job.progress.record_chunk(chunk, elapsed);
            debug!(
                "Chunk {}/{} acknowledged in {:?} ({} of {} bytes)",
                chunk.index + 1,
                total_chunks,
                elapsed,
                update.uploaded_bytes,
                update.total_bytes
            );
            self.publish(update);

            if let Some(url) = ack.final_url {
                let update = job.progress.complete(chunk);
                self.publish(update);
                job.final_url = Some(url.clone());
                return Ok(url);
            }

            if job.should_cool_down(chunk) {
                debug!("Cooling down for {:?} after chunk {}", job.pause_duration, chunk.index);
                job.cooldowns.push(chunk.index);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(ClientError::Cancelled { chunk_index: chunk.index + 1 });
                    }
                    _ = tokio::time::sleep(job.pause_duration) => {}
                }
            }
        }

        Err(ClientError::Incomplete { total_chunks })
    }

    fn publish(&self, update: ProgressUpdate) {
        if let Some(cb) = &self.progress {
            cb(update);
        }
    }
}
