//! Client configuration

use crate::{ClientError, Result};
use std::time::Duration;

const MIB: u64 = 1024 * 1024;

/// Default chunk size for the chunked video path: 100 MiB
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * MIB;

/// A cooldown is taken each time cumulative bytes cross a multiple of this: 300 MiB
pub const DEFAULT_PAUSE_THRESHOLD: u64 = 300 * MIB;

/// Length of the cooldown pause
pub const DEFAULT_PAUSE_DURATION: Duration = Duration::from_millis(300);

/// Total attempts per chunk (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit; the n-th retry waits `n * DEFAULT_RETRY_BASE_DELAY`
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Chunked upload endpoint (`upload.php`)
    pub endpoint: String,
    /// Image upload endpoint (`upload_image.php`)
    pub image_endpoint: Option<String>,
    /// Third-party direct upload endpoint used for small videos
    pub direct_endpoint: Option<String>,
    /// Access token, sent as a bearer token
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Total attempts per chunk or single-shot request
    pub max_attempts: u32,
    /// Linear backoff unit between attempts
    pub retry_base_delay: Duration,
    /// Retry `status: "error"` responses like transport failures
    pub retry_application_errors: bool,
    /// Chunk size (bytes)
    pub chunk_size: u64,
    /// Cooldown threshold (bytes)
    pub pause_threshold: u64,
    /// Cooldown duration
    pub pause_duration: Duration,
    /// Videos up to this size go through the direct endpoint, when configured
    pub direct_upload_threshold: u64,
    /// Largest accepted video (bytes)
    pub max_video_size: u64,
    /// Largest accepted image (bytes)
    pub max_image_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/upload.php".to_string(),
            image_endpoint: None,
            direct_endpoint: None,
            access_token: None,
            timeout: Duration::from_secs(600),
            user_agent: format!("mom-client/{}", env!("CARGO_PKG_VERSION")),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            retry_application_errors: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            pause_threshold: DEFAULT_PAUSE_THRESHOLD,
            pause_duration: DEFAULT_PAUSE_DURATION,
            direct_upload_threshold: 50 * MIB,
            max_video_size: 5 * 1024 * MIB, // 5 GiB
            max_image_size: 10 * MIB,
        }
    }
}

impl Config {
    /// Create a new config with the given chunk upload endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the image upload endpoint
    pub fn with_image_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.image_endpoint = Some(endpoint.into());
        self
    }

    /// Set the direct upload endpoint
    pub fn with_direct_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.direct_endpoint = Some(endpoint.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set chunk size
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set cooldown threshold and duration
    pub fn with_pause(mut self, threshold: u64, duration: Duration) -> Self {
        self.pause_threshold = threshold;
        self.pause_duration = duration;
        self
    }

    /// Set retry budget and backoff unit
    pub fn with_retries(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_base_delay = base_delay;
        self
    }

    /// Fail a chunk at once when the server reports an application error
    pub fn without_application_retries(mut self) -> Self {
        self.retry_application_errors = false;
        self
    }

    /// Check the configuration for values the uploader cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ClientError::Config("endpoint must not be empty".into()));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::Config("chunk_size must be positive".into()));
        }
        if self.pause_threshold == 0 {
            return Err(ClientError::Config("pause_threshold must be positive".into()));
        }
        if self.max_attempts == 0 {
            return Err(ClientError::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 100 * 1024 * 1024);
        assert_eq!(config.pause_threshold, 300 * 1024 * 1024);
        assert_eq!(config.pause_duration, Duration::from_millis(300));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert!(config.retry_application_errors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let config = Config::new("http://example.test/upload.php").with_chunk_size(0);
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let config = Config::new("  ");
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let config = Config::default().with_retries(0, Duration::ZERO);
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }
}
