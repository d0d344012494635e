//! Upload commands

use crate::CliConfig;
use anyhow::Context;
use mom_client::{CancellationToken, MomClient, ProgressCallback, ProgressUpdate, UploadFile};
use std::path::Path;
use tracing::{error, info};

fn log_progress() -> ProgressCallback {
    Box::new(|update: ProgressUpdate| {
        let eta = update
            .eta
            .map(|eta| eta.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            "Chunk {}/{}: {}% at {:.2} MB/s, ETA {}",
            update.chunk_index + 1,
            update.total_chunks,
            update.percent,
            update.speed_mbps,
            eta
        );
    })
}

/// Upload a video and return its final URL
pub async fn upload_video(
    config: &CliConfig,
    path: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<String> {
    let client = MomClient::new(config.client_config()?)?;
    let file = UploadFile::open(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    if client.uses_direct_path(file.size()) {
        let outcome = client.upload_video(file, Some(log_progress()), cancel).await?;
        return Ok(outcome.final_url);
    }

    let mut job = client.new_video_job(file)?;
    match client.upload_video_job(&mut job, Some(log_progress()), cancel).await {
        Ok(url) => Ok(url),
        Err(err) => {
            error!(
                "Stopped at {}% ({} of {} bytes, {} chunk(s) acknowledged)",
                job.percent(),
                job.uploaded_bytes(),
                job.file().size(),
                job.chunk_timings().len()
            );
            Err(err.into())
        }
    }
}

/// Upload an image and return its URL
pub async fn upload_image(config: &CliConfig, path: &Path) -> anyhow::Result<String> {
    let client = MomClient::new(config.client_config()?)?;
    let file = UploadFile::open(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    Ok(client.upload_image(file).await?)
}
