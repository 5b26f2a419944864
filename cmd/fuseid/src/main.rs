//! fuseid - multi-modal biometric identification server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fuseid_classifier::ModelSet;
use fuseid_server::{Server, ServerConfig};

/// Multi-modal biometric identification server.
///
/// Serves identity predictions over WebSocket: each session sends a raw
/// audio clip followed by a gesture CSV and receives the fused identity
/// label.
#[derive(Parser, Debug)]
#[command(name = "fuseid")]
#[command(about = "Multi-modal biometric identification server")]
struct Args {
    /// WebSocket listen address
    #[arg(short, long, default_value = "127.0.0.1:8086")]
    listen: String,

    /// Path to the audio model artifact
    #[arg(long)]
    audio_model: PathBuf,

    /// Path to the gesture model artifact
    #[arg(long)]
    gesture_model: PathBuf,

    /// Staging directory for in-flight artifacts (default: system temp)
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// External codec executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Models are load-once, read-only for the process lifetime. Failing
    // here means the process never starts serving.
    info!("loading audio and gesture models");
    let models = ModelSet::load(&args.audio_model, &args.gesture_model)
        .context("model artifacts could not be loaded; refusing to serve")?;
    info!("audio and gesture models loaded");

    let mut config = ServerConfig::new(args.listen.as_str()).with_ffmpeg(args.ffmpeg.as_str());
    if let Some(dir) = args.staging_dir {
        config = config.with_staging_dir(dir);
    }

    let server = Server::bind(config, models).await?;

    tokio::select! {
        result = server.serve() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}
