//! Uploader configuration

use mom_client::{ClientError, Config, DEFAULT_CHUNK_SIZE, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings gathered from command-line flags and the environment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CliConfig {
    /// Chunk upload endpoint (`upload.php`)
    pub endpoint: String,
    /// Image upload endpoint (`upload_image.php`)
    pub image_endpoint: Option<String>,
    /// Direct upload provider for small videos
    pub direct_endpoint: Option<String>,
    /// Bearer token for the backend and the direct provider
    pub token: Option<String>,
    /// Chunk size in MiB
    pub chunk_size_mb: u64,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Always chunk, even when a direct endpoint is configured
    pub force_chunked: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/upload.php".to_string(),
            image_endpoint: None,
            direct_endpoint: None,
            token: None,
            chunk_size_mb: DEFAULT_CHUNK_SIZE / (1024 * 1024),
            timeout_secs: 600,
            force_chunked: false,
        }
    }
}

impl CliConfig {
    /// Build the client configuration
    pub fn client_config(&self) -> Result<Config> {
        let chunk_size = self.chunk_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            ClientError::Config(format!("chunk size of {} MiB is too large", self.chunk_size_mb))
        })?;

        let mut config = Config::new(self.endpoint.clone())
            .with_chunk_size(chunk_size)
            .with_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(token) = &self.token {
            config = config.with_token(token.clone());
        }
        if let Some(endpoint) = &self.image_endpoint {
            config = config.with_image_endpoint(endpoint.clone());
        }
        if !self.force_chunked {
            if let Some(endpoint) = &self.direct_endpoint {
                config = config.with_direct_endpoint(endpoint.clone());
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_client_defaults() {
        let config = CliConfig::default().client_config().unwrap();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.access_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_force_chunked_drops_direct_endpoint() {
        let cli = CliConfig {
            direct_endpoint: Some("https://provider.test/upload".into()),
            token: Some("t".into()),
            chunk_size_mb: 8,
            force_chunked: true,
            ..Default::default()
        };
        let config = cli.client_config().unwrap();
        assert!(config.direct_endpoint.is_none());
        assert_eq!(config.chunk_size, 8 * 1024 * 1024);
        assert_eq!(config.access_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_oversized_chunk_is_a_config_error() {
        let cli = CliConfig {
            chunk_size_mb: u64::MAX / 2,
            ..Default::default()
        };
        assert!(matches!(cli.client_config(), Err(ClientError::Config(_))));
    }
}
