//! Common types for the client SDK

use crate::{ClientError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Response body of the chunk endpoint
///
/// Anything other than `status: "error"` counts as an acknowledgement.
/// Fields are loosely typed: an unexpected `status` or `message` type is
/// not a protocol failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkEnvelope {
    /// Usually `"success"` or `"error"`
    #[serde(default)]
    pub status: Option<Value>,
    /// Error detail
    #[serde(default)]
    pub message: Option<Value>,
    /// Present only on the chunk that completes the file
    #[serde(default)]
    pub final_url: Option<Value>,
}

impl ChunkEnvelope {
    /// Whether the server rejected the chunk
    pub fn is_error(&self) -> bool {
        matches!(&self.status, Some(Value::String(s)) if s == "error")
    }

    /// Error detail, when it is a non-blank string
    pub fn message(&self) -> Option<&str> {
        non_blank_str(self.message.as_ref())
    }

    /// Completion URL, when it is a non-blank string
    pub fn final_url(&self) -> Option<&str> {
        non_blank_str(self.final_url.as_ref())
    }
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// The backend's standard `{success, data, message}` wrapper
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success: false` into an application error
    pub fn into_result(self, http_status: u16) -> Result<T> {
        if !self.success {
            return Err(ClientError::Application(
                self.message.unwrap_or_else(|| "Request failed".to_string()),
            ));
        }
        self.data.ok_or_else(|| ClientError::Protocol {
            status: http_status,
            message: "envelope reports success but carries no data".to_string(),
        })
    }
}

/// Payload of a successful single-shot upload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// Public URL of the stored file
    pub url: String,
}

/// Lifecycle of an upload job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Idle,
    Uploading,
    Succeeded,
    Failed,
    Cancelled,
}

impl UploadStatus {
    /// No chunk is ever sent once a job is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// How a file reached the server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    Chunked,
    Direct,
}

/// Result of a finished upload
#[derive(Clone, Debug)]
pub struct UploadOutcome {
    /// Server-assigned URL
    pub final_url: String,
    /// Bytes acknowledged by the server
    pub uploaded_bytes: u64,
    /// Number of requests the file was split into
    pub total_chunks: usize,
    /// Elapsed time per acknowledged chunk
    pub chunk_timings: Vec<Duration>,
    /// Path taken
    pub method: UploadMethod,
}
