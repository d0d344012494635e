//! # MomAcademy Uploader
//!
//! Command-line front end for the `mom-client` upload SDK.
//!
//! - `mom-upload video <PATH>`: chunked (or direct, for small files) video upload
//! - `mom-upload image <PATH>`: single-request image upload
//!
//! Ctrl-C cancels an upload between chunks and aborts the request in flight.

pub mod commands;
pub mod config;

pub use commands::{upload_image, upload_video};
pub use config::CliConfig;
