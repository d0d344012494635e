//! Chunked video upload example
//!
//! This example demonstrates:
//! - Uploading a video in chunks with progress reporting
//! - Driving a job by hand and inspecting it after a failure
//! - Cancelling an upload from another task
//!
//! Run with: cargo run --example upload_video -- path/to/lesson.mp4

use mom_client::{CancellationToken, Config, MomClient, ProgressUpdate, UploadFile};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "lesson-01.mp4".to_string());

    println!("🎬 MomAcademy - Chunked Video Upload Example\n");

    let config = Config::new("http://localhost:8000/upload.php")
        .with_token("your-access-token-here")
        .with_chunk_size(8 * 1024 * 1024);
    let client = MomClient::new(config)?;

    // ==================== Simple Upload ====================

    println!("📤 Uploading {}...", path);

    let progress = Box::new(|update: ProgressUpdate| {
        let eta = update.eta.map(|e| e.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "   Progress: {}% - Chunk {}/{} - {:.2} MB/s - ETA {}",
            update.percent,
            update.chunk_index + 1,
            update.total_chunks,
            update.speed_mbps,
            eta
        );
    });

    let file = UploadFile::open(&path).await?;
    match client.upload_video(file, Some(progress), &CancellationToken::new()).await {
        Ok(outcome) => println!(
            "   ✅ Uploaded {} bytes in {} chunk(s): {}",
            outcome.uploaded_bytes, outcome.total_chunks, outcome.final_url
        ),
        Err(e) => println!("   ⚠️  {}", e),
    }

    // ==================== Manual Job With Cancellation ====================

    println!("\n📤 Manual job, cancelled after 2 seconds...");

    let file = UploadFile::open(&path).await?;
    let mut job = client.new_video_job(file)?;
    println!("   {} bytes in {} chunk(s)", job.file().size(), job.total_chunks());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        trigger.cancel();
    });

    let result = client.upload_video_job(&mut job, None, &cancel).await;
    println!("   Status: {:?}", job.status());
    println!("   Reached {}% ({} bytes)", job.percent(), job.uploaded_bytes());
    for line in job.progress_log() {
        println!("   {}", line);
    }
    if let Err(e) = result {
        println!("   ⚠️  {}", e);
    }

    println!("\n✨ Done!");
    Ok(())
}
