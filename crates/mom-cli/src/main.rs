//! MomAcademy Uploader - upload course media from the command line

use clap::{Parser, Subcommand};
use mom_cli::{CliConfig, upload_image, upload_video};
use mom_client::CancellationToken;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mom-upload")]
#[command(about = "Upload course videos and images to MomAcademy")]
#[command(version)]
struct Args {
    /// Chunk upload endpoint
    #[arg(long, default_value = "http://localhost:8000/upload.php", env = "MOM_ENDPOINT", global = true)]
    endpoint: String,

    /// Image upload endpoint
    #[arg(long, env = "MOM_IMAGE_ENDPOINT", global = true)]
    image_endpoint: Option<String>,

    /// Direct upload provider endpoint, used for small videos
    #[arg(long, env = "MOM_DIRECT_ENDPOINT", global = true)]
    direct_endpoint: Option<String>,

    /// Access token
    #[arg(long, env = "MOM_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Chunk size in MiB
    #[arg(long, default_value = "100", env = "MOM_CHUNK_SIZE_MB", global = true)]
    chunk_size_mb: u64,

    /// Request timeout in seconds
    #[arg(long, default_value = "600", env = "MOM_TIMEOUT_SECS", global = true)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long, env = "MOM_DEBUG", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a video
    Video {
        path: PathBuf,

        /// Chunk the file even if it qualifies for a direct upload
        #[arg(long)]
        chunked: bool,
    },
    /// Upload an image
    Image { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("mom_client={},mom_cli={}", log_level, log_level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = CliConfig {
        endpoint: args.endpoint,
        image_endpoint: args.image_endpoint,
        direct_endpoint: args.direct_endpoint,
        token: args.token,
        chunk_size_mb: args.chunk_size_mb,
        timeout_secs: args.timeout_secs,
        ..Default::default()
    };

    let url = match args.command {
        Command::Video { path, chunked } => {
            config.force_chunked = chunked;
            tracing::info!("Uploading video {} to {}", path.display(), config.endpoint);

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling upload");
                    on_interrupt.cancel();
                }
            });

            upload_video(&config, &path, &cancel).await?
        }
        Command::Image { path } => {
            tracing::info!("Uploading image {}", path.display());
            upload_image(&config, &path).await?
        }
    };

    println!("{}", url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["mom-upload", "video", "a.mp4"], false)]
    #[case(&["mom-upload", "video", "a.mp4", "--chunked"], true)]
    #[case(&["mom-upload", "--chunk-size-mb", "8", "video", "--chunked", "a.mp4"], true)]
    fn test_video_args(#[case] argv: &[&str], #[case] expect_chunked: bool) {
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Command::Video { path, chunked } => {
                assert_eq!(path, PathBuf::from("a.mp4"));
                assert_eq!(chunked, expect_chunked);
            }
            other => panic!("Expected video command, got {:?}", other),
        }
    }

    #[rstest]
    #[case(&["mom-upload"])]
    #[case(&["mom-upload", "video"])]
    #[case(&["mom-upload", "--chunk-size-mb", "lots", "image", "x.png"])]
    fn test_bad_args(#[case] argv: &[&str]) {
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["mom-upload", "image", "x.png", "--token", "abc"]).unwrap();
        assert_eq!(args.token.as_deref(), Some("abc"));
        assert!(matches!(args.command, Command::Image { .. }));
    }
}
