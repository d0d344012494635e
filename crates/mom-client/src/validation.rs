//! Pre-flight file checks
//!
//! Runs before any request is built; a rejected file never reaches the network.

use crate::{Config, UploadFile, error::ValidationError};

/// What an uploader accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Top-level MIME type
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }

    /// Largest accepted size for this kind
    pub fn size_limit(&self, config: &Config) -> u64 {
        match self {
            Self::Video => config.max_video_size,
            Self::Image => config.max_image_size,
        }
    }
}

/// Declared MIME type, or one guessed from the file extension
pub fn detect_mime(file: &UploadFile) -> String {
    if let Some(ct) = file.content_type() {
        return ct.trim().to_ascii_lowercase();
    }
    mime_guess::from_path(file.name())
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Check emptiness, media type and size, in that order
pub fn validate(file: &UploadFile, kind: MediaKind, config: &Config) -> Result<(), ValidationError> {
    if file.size() == 0 {
        return Err(ValidationError::EmptyFile);
    }

    let mime = detect_mime(file);
    let top_level = mime.split('/').next().unwrap_or_default();
    if top_level != kind.mime_prefix() {
        return Err(ValidationError::UnsupportedType {
            expected: kind.mime_prefix(),
            found: mime,
        });
    }

    let limit = kind.size_limit(config);
    if file.size() > limit {
        return Err(ValidationError::TooLarge {
            size: file.size(),
            limit,
        });
    }

    Ok(())
}
