//! Upload payloads
//!
//! A file is either held in memory or read from disk one byte range at a
//! time, so a disk-backed upload never materializes more than one chunk.

use crate::Result;
use bytes::Bytes;
use std::io::{Error as IoError, ErrorKind, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

#[derive(Clone, Debug)]
enum Source {
    Memory(Bytes),
    Disk(PathBuf),
}

/// An immutable file selected for upload
#[derive(Clone, Debug)]
pub struct UploadFile {
    name: String,
    size: u64,
    content_type: Option<String>,
    source: Source,
}

impl UploadFile {
    /// Wrap an in-memory buffer
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            content_type: None,
            source: Source::Memory(data),
        }
    }

    /// Reference a file on disk; only its size is read now
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(IoError::new(ErrorKind::InvalidInput, format!("{} is not a file", path.display())).into());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        Ok(Self {
            name,
            size: metadata.len(),
            content_type: None,
            source: Source::Disk(path.to_path_buf()),
        })
    }

    /// Declare the MIME type instead of guessing it from the name
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name sent to the server
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Explicit MIME type, if one was set
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Read one byte range
    pub async fn read_range(&self, range: Range<u64>) -> Result<Bytes> {
        if range.end > self.size || range.start > range.end {
            return Err(IoError::new(
                ErrorKind::UnexpectedEof,
                format!("range {}..{} outside file of {} bytes", range.start, range.end, self.size),
            )
            .into());
        }

        match &self.source {
            Source::Memory(data) => Ok(data.slice(range.start as usize..range.end as usize)),
            Source::Disk(path) => {
                let mut file = File::open(path).await?;
                file.seek(SeekFrom::Start(range.start)).await?;

                let mut buffer = vec![0u8; (range.end - range.start) as usize];
                file.read_exact(&mut buffer).await?;

                debug!(
                    "Read {} bytes at offset {} from {}",
                    buffer.len(),
                    range.start,
                    path.display()
                );
                Ok(Bytes::from(buffer))
            }
        }
    }

    /// Read the whole file (single-shot uploads only)
    pub async fn read_all(&self) -> Result<Bytes> {
        self.read_range(0..self.size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_memory_ranges() {
        let file = UploadFile::from_bytes("clip.mp4", (0u8..100).collect::<Vec<_>>());
        assert_eq!(file.size(), 100);
        assert_eq!(file.name(), "clip.mp4");

        let slice = file.read_range(10..20).await.unwrap();
        assert_eq!(&slice[..], &(10u8..20).collect::<Vec<_>>()[..]);

        assert!(file.read_range(90..101).await.is_err());
    }

    #[tokio::test]
    async fn test_disk_ranges() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        tmp.write_all(&data).unwrap();
        tmp.flush().unwrap();

        let file = UploadFile::open(tmp.path()).await.unwrap();
        assert_eq!(file.size(), 4096);

        let slice = file.read_range(1000..3000).await.unwrap();
        assert_eq!(&slice[..], &data[1000..3000]);

        let all = file.read_all().await.unwrap();
        assert_eq!(all.len(), 4096);
    }

    #[tokio::test]
    async fn test_open_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UploadFile::open(dir.path()).await.is_err());
    }
}
