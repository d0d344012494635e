//! Single-chunk transmission
//!
//! A transmitter sends exactly one chunk and reports the outcome. It never
//! retries and never touches job state; both belong to the uploader.

use crate::{ClientError, Result, types::ChunkEnvelope};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, multipart::{Form, Part}};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Fallback when the server reports an error without a message
const GENERIC_CHUNK_ERROR: &str = "Chunk upload failed";

/// One chunk ready to be sent
#[derive(Clone, Debug)]
pub struct ChunkRequest<'a> {
    /// Zero-based chunk index
    pub index: usize,
    /// Number of chunks in the file
    pub total_chunks: usize,
    /// Original file name, used by the server to group chunks
    pub filename: &'a str,
    /// Chunk bytes
    pub data: Bytes,
}

/// Server acknowledgement of one chunk
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkAck {
    /// Completion signal: the reassembled file's URL
    pub final_url: Option<String>,
}

/// Sends one chunk to the upload endpoint
#[async_trait]
pub trait ChunkTransmitter: Send + Sync {
    /// Transmit a chunk once
    async fn send_chunk(&self, chunk: ChunkRequest<'_>) -> Result<ChunkAck>;
}

#[async_trait]
impl<T: ChunkTransmitter + ?Sized> ChunkTransmitter for Arc<T> {
    async fn send_chunk(&self, chunk: ChunkRequest<'_>) -> Result<ChunkAck> {
        (**self).send_chunk(chunk).await
    }
}

/// Multipart POST transmitter for `upload.php`
#[derive(Clone, Debug)]
pub struct HttpTransmitter {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl HttpTransmitter {
    /// Create a transmitter on an existing HTTP client
    pub fn new(http: Client, endpoint: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            access_token,
        }
    }

    /// Target URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChunkTransmitter for HttpTransmitter {
    #[instrument(skip(self, chunk), fields(index = chunk.index, total = chunk.total_chunks))]
    async fn send_chunk(&self, chunk: ChunkRequest<'_>) -> Result<ChunkAck> {
        let len = chunk.data.len() as u64;
        let part = Part::stream_with_length(chunk.data, len)
            .file_name(chunk.filename.to_string())
            .mime_str("application/octet-stream")?;

        let form = Form::new()
            .part("chunk", part)
            .text("filename", chunk.filename.to_string())
            .text("chunkIndex", chunk.index.to_string())
            .text("totalChunks", chunk.total_chunks.to_string());

        let mut req = self.http.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        debug!("Sending chunk {} ({} bytes) to {}", chunk.index, len, self.endpoint);
        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::protocol(status.as_u16(), &text));
        }

        parse_chunk_response(status.as_u16(), &text)
    }
}

/// Classify a 2xx chunk response body
///
/// Any JSON value is accepted; only an object with `status: "error"` is a
/// rejection.
pub(crate) fn parse_chunk_response(http_status: u16, body: &str) -> Result<ChunkAck> {
    let value: Value = serde_json::from_str(body).map_err(|e| ClientError::Protocol {
        status: http_status,
        message: format!("malformed JSON body: {}", e),
    })?;

    let envelope = match value {
        Value::Object(_) => serde_json::from_value::<ChunkEnvelope>(value).unwrap_or_default(),
        _ => ChunkEnvelope::default(),
    };

    if envelope.is_error() {
        let message = envelope.message().unwrap_or(GENERIC_CHUNK_ERROR);
        return Err(ClientError::Application(message.to_string()));
    }

    Ok(ChunkAck {
        final_url: envelope.final_url().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_without_completion() {
        let ack = parse_chunk_response(200, r#"{"status":"success"}"#).unwrap();
        assert_eq!(ack, ChunkAck::default());
    }

    #[test]
    fn test_parse_completion() {
        let ack = parse_chunk_response(200, r#"{"status":"success","finalUrl":"https://host/f.mp4"}"#).unwrap();
        assert_eq!(ack.final_url.as_deref(), Some("https://host/f.mp4"));

        // Blank URLs are not a completion signal
        let ack = parse_chunk_response(200, r#"{"status":"success","finalUrl":""}"#).unwrap();
        assert!(ack.final_url.is_none());
    }

    #[test]
    fn test_parse_application_error() {
        match parse_chunk_response(200, r#"{"status":"error","message":"Invalid chunk"}"#) {
            Err(ClientError::Application(msg)) => assert_eq!(msg, "Invalid chunk"),
            other => panic!("Expected Application error, got {:?}", other),
        }

        match parse_chunk_response(200, r#"{"status":"error"}"#) {
            Err(ClientError::Application(msg)) => assert_eq!(msg, GENERIC_CHUNK_ERROR),
            other => panic!("Expected Application error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_non_string_status_is_acknowledged() {
        let ack = parse_chunk_response(200, r#"{"status":200,"finalUrl":"https://host/f.mp4"}"#).unwrap();
        assert_eq!(ack.final_url.as_deref(), Some("https://host/f.mp4"));

        let ack = parse_chunk_response(200, r#"{"status":true}"#).unwrap();
        assert!(ack.final_url.is_none());

        // Valid JSON that is not an object still acknowledges the chunk
        let ack = parse_chunk_response(200, r#""ok""#).unwrap();
        assert_eq!(ack, ChunkAck::default());
    }

    #[test]
    fn test_parse_error_with_non_string_message() {
        match parse_chunk_response(200, r#"{"status":"error","message":{"code":413}}"#) {
            Err(ClientError::Application(msg)) => assert_eq!(msg, GENERIC_CHUNK_ERROR),
            other => panic!("Expected Application error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_json() {
        match parse_chunk_response(200, "<html>Fatal error</html>") {
            Err(ClientError::Protocol { status, message }) => {
                assert_eq!(status, 200);
                assert!(message.starts_with("malformed JSON body"));
            }
            other => panic!("Expected Protocol error, got {:?}", other),
        }
    }
}
