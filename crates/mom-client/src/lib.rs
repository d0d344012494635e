//! # MomAcademy Upload Client
//!
//! Client SDK for uploading course media to the MomAcademy backend.
//!
//! ## Features
//!
//! - **Chunked uploads**: large videos are split into 100 MiB ranges and sent
//!   one at a time to `upload.php`
//! - **Bounded retry**: up to 3 attempts per chunk with linear backoff
//! - **Telemetry**: cumulative speed, ETA and a per-percent progress trail
//! - **Cooldowns**: a short pause every 300 MiB to spare the server
//! - **Cancellation**: aborts the in-flight request and stops the chunk loop
//! - **Direct uploads**: small videos and images go out in one request
//!
//! ## Example
//!
//! ```rust,ignore
//! use mom_client::{Config, MomClient, UploadFile};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = MomClient::new(
//!         Config::new("https://api.momacademy.example/upload.php").with_token("your-token"),
//!     )?;
//!
//!     let file = UploadFile::open("lesson-01.mp4").await?;
//!     let outcome = client.upload_video(file, None, &CancellationToken::new()).await?;
//!     println!("Uploaded to {}", outcome.final_url);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod direct;
mod error;
mod file;
pub mod progress;
pub mod retry;
pub mod slicer;
pub mod store;
pub mod transmitter;
mod types;
pub mod uploader;
pub mod validation;

pub use client::MomClient;
pub use config::{
    Config, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_PAUSE_DURATION,
    DEFAULT_PAUSE_THRESHOLD, DEFAULT_RETRY_BASE_DELAY,
};
pub use direct::DirectUploader;
pub use error::{ClientError, Result, ValidationError};
pub use file::UploadFile;
pub use progress::{Eta, ProgressCallback, ProgressLine, ProgressUpdate};
pub use retry::RetryPolicy;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, ViewerFlags};
pub use transmitter::{ChunkAck, ChunkRequest, ChunkTransmitter, HttpTransmitter};
pub use types::*;
pub use uploader::{ChunkedUploader, UploadJob};
pub use validation::MediaKind;

// Callers need the token type to cancel uploads
pub use tokio_util::sync::CancellationToken;
