//! Main client implementation

use crate::{
    ClientError, Config, Result, UploadFile,
    direct::DirectUploader,
    progress::{Eta, ProgressCallback, ProgressUpdate},
    retry::RetryPolicy,
    transmitter::HttpTransmitter,
    types::{UploadMethod, UploadOutcome},
    uploader::{ChunkedUploader, UploadJob},
    validation::{self, MediaKind},
};
use reqwest::Client;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// MomAcademy upload client
pub struct MomClient {
    config: Config,
    http: Client,
}

impl MomClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { config, http })
    }

    /// Create with endpoint URL
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Self::new(Config::new(endpoint))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// HTTP transmitter for the chunk endpoint
    pub fn transmitter(&self) -> HttpTransmitter {
        HttpTransmitter::new(
            self.http.clone(),
            self.config.endpoint.clone(),
            self.config.access_token.clone(),
        )
    }

    /// Orchestrator bound to the chunk endpoint
    pub fn chunked_uploader(&self) -> Result<ChunkedUploader<HttpTransmitter>> {
        ChunkedUploader::new(self.transmitter(), &self.config)
    }

    /// Single-request uploader for small videos, if a direct endpoint is set
    pub fn direct_uploader(&self) -> Option<DirectUploader> {
        self.config.direct_endpoint.as_ref().map(|endpoint| {
            DirectUploader::new(
                self.http.clone(),
                endpoint.clone(),
                self.config.access_token.clone(),
                RetryPolicy::from_config(&self.config),
            )
        })
    }

    // ==================== Video Uploads ====================

    /// Whether a video of `size` bytes skips chunking
    pub fn uses_direct_path(&self, size: u64) -> bool {
        self.config.direct_endpoint.is_some() && size <= self.config.direct_upload_threshold
    }

    /// Validate `file` as a video and create an idle chunked job for it
    pub fn new_video_job(&self, file: UploadFile) -> Result<UploadJob> {
        validation::validate(&file, MediaKind::Video, &self.config)?;
        Ok(self.chunked_uploader()?.new_job(file))
    }

    /// Upload a video, directly when it is small enough, otherwise in chunks
    #[instrument(skip(self, file, progress, cancel), fields(file = %file.name(), size = file.size()))]
    pub async fn upload_video(
        &self,
        file: UploadFile,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        validation::validate(&file, MediaKind::Video, &self.config)?;

        if self.uses_direct_path(file.size()) {
            if let Some(direct) = self.direct_uploader() {
                debug!("Using direct upload for {} bytes", file.size());
                return self.upload_direct(&direct, &file, progress, cancel).await;
            }
        }

        let mut uploader = self.chunked_uploader()?;
        if let Some(cb) = progress {
            uploader = uploader.with_progress(cb);
        }
        uploader.upload(file, cancel).await
    }

    /// Run a job from [`new_video_job`](Self::new_video_job) through the
    /// chunk endpoint. The job keeps its partial progress if this fails.
    pub async fn upload_video_job(
        &self,
        job: &mut UploadJob,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut uploader = self.chunked_uploader()?;
        if let Some(cb) = progress {
            uploader = uploader.with_progress(cb);
        }
        uploader.run(job, cancel).await
    }

    async fn upload_direct(
        &self,
        direct: &DirectUploader,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        let started = Instant::now();
        let final_url = direct.upload(file, cancel).await?;
        let elapsed = started.elapsed();

        if let Some(cb) = progress {
            let secs = elapsed.as_secs_f64();
            cb(ProgressUpdate {
                percent: 100,
                uploaded_bytes: file.size(),
                total_bytes: file.size(),
                chunk_index: 0,
                total_chunks: 1,
                speed_mbps: if secs > 0.0 {
                    file.size() as f64 / (1024.0 * 1024.0) / secs
                } else {
                    0.0
                },
                eta: Some(Eta::from_secs(0)),
            });
        }

        Ok(UploadOutcome {
            final_url,
            uploaded_bytes: file.size(),
            total_chunks: 1,
            chunk_timings: vec![elapsed],
            method: UploadMethod::Direct,
        })
    }

    // ==================== Image Uploads ====================

    /// Upload an image to the image endpoint and return its URL
    #[instrument(skip(self, file), fields(file = %file.name(), size = file.size()))]
    pub async fn upload_image(&self, file: UploadFile) -> Result<String> {
        validation::validate(&file, MediaKind::Image, &self.config)?;

        let endpoint = self
            .config
            .image_endpoint
            .as_ref()
            .ok_or_else(|| ClientError::Config("image_endpoint is not configured".into()))?;

        DirectUploader::new(
            self.http.clone(),
            endpoint.clone(),
            self.config.access_token.clone(),
            RetryPolicy::from_config(&self.config),
        )
        .upload(&file, &CancellationToken::new())
        .await
    }
}
