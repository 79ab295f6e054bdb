use chrono::{DateTime, Local};
use clap::Parser;
use dotenvy::dotenv;
use image_logger::api::handlers::upload::UPLOAD_FIELD;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sends a captured image to the image logger, as the capture device does
/// after each inference run.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to upload
    file: PathBuf,

    /// Upload endpoint of the image logger
    #[arg(short, long, default_value = "http://127.0.0.1:3000/")]
    server: String,

    /// Name the upload after the current local time, e.g. 2024-05-01_13_45_10.jpg
    #[arg(short, long)]
    timestamped: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "send_capture=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data = match tokio::fs::read(&args.file).await {
        Ok(data) => data,
        Err(e) => {
            error!("❌ Cannot read {}: {}", args.file.display(), e);
            std::process::exit(1);
        }
    };

    let file_name = upload_name(&args.file, args.timestamped, Local::now());
    info!("📤 Sending {} ({} bytes) to {}", file_name, data.len(), args.server);

    let form = Form::new().part(UPLOAD_FIELD, Part::bytes(data).file_name(file_name));
    let response = reqwest::Client::new()
        .post(&args.server)
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    info!("Recently captured image transferred ({})", status);
    println!("Server: {}", text);

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn upload_name(path: &Path, timestamped: bool, now: DateTime<Local>) -> String {
    let original = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !timestamped {
        return original;
    }

    let stamp = now.format("%Y-%m-%d_%H_%M_%S");
    match path.extension() {
        Some(ext) => format!("{}.{}", stamp, ext.to_string_lossy()),
        None => stamp.to_string(),
    }
}
