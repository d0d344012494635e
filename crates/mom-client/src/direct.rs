//! Single-request uploads
//!
//! Small videos go to the third-party direct upload provider and images go
//! to `upload_image.php`. Both take the whole file as one multipart `file`
//! field and answer with the `{success, data: {url}, message}` envelope.

use crate::{
    ClientError, Result, UploadFile,
    retry::RetryPolicy,
    types::{ApiEnvelope, UploadedMedia},
    validation::detect_mime,
};
use reqwest::{Client, multipart::{Form, Part}};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Uploads a file in one token-authenticated POST
#[derive(Clone, Debug)]
pub struct DirectUploader {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
    retry: RetryPolicy,
}

impl DirectUploader {
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        access_token: Option<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            access_token,
            retry,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload `file` and return the URL the server assigned to it
    #[instrument(skip(self, file, cancel), fields(file = %file.name(), size = file.size()))]
    pub async fn upload(&self, file: &UploadFile, cancel: &CancellationToken) -> Result<String> {
        let data = file.read_all().await?;
        let mime = detect_mime(file);

        let url = self
            .retry
            .run(0, cancel, |attempt| {
                let data = data.clone();
                let mime = mime.clone();
                async move {
                    debug!("Direct upload attempt {} to {}", attempt, self.endpoint);
                    self.send_once(file.name(), data, &mime).await
                }
            })
            .await
            .map_err(|err| match err {
                // One request, not a chunk
                ClientError::ChunkFailed { attempts, source, .. } => {
                    ClientError::UploadFailed { attempts, source }
                }
                other => other,
            })?;

        info!("Direct upload of {} complete: {}", file.name(), url);
        Ok(url)
    }

    async fn send_once(&self, name: &str, data: bytes::Bytes, mime: &str) -> Result<String> {
        let len = data.len() as u64;
        let part = Part::stream_with_length(data, len)
            .file_name(name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part("file", part);

        let mut req = self.http.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::protocol(status.as_u16(), &text));
        }

        let envelope: ApiEnvelope<UploadedMedia> =
            serde_json::from_str(&text).map_err(|e| ClientError::Protocol {
                status: status.as_u16(),
                message: format!("malformed JSON body: {}", e),
            })?;
        Ok(envelope.into_result(status.as_u16())?.url)
    }
}
