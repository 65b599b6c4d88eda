use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use stream_upload::client::upload::DEFAULT_ENDPOINT;
use stream_upload::client::{ProgressTracker, UploadClient, UploadProgress, select_file};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Upload one file with live progress", long_about = None)]
struct Args {
    /// File to upload. Without one nothing is sent.
    file: Option<PathBuf>,

    /// Upload endpoint
    #[arg(short, long, env = "UPLOAD_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    stream_upload::logging::init_tracing("stream_upload=info,upload_client=info");

    let Some(file) = select_file(args.file).await? else {
        info!("No file selected, nothing to upload.");
        return Ok(());
    };

    let client = UploadClient::new(args.endpoint);
    let mut tracker = ProgressTracker::with_listener(|progress| match progress {
        UploadProgress::Uploading { percent } => info!("{}%", percent),
        UploadProgress::Done => info!("✅ Upload finished"),
        UploadProgress::Failed { reason } => tracing::error!("❌ Upload failed: {}", reason),
        UploadProgress::Idle => {}
    });

    let response = client.upload(&file, &mut tracker).await?;
    info!("📨 Server replied: {}", response);

    Ok(())
}
