use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use veriface_config::Config;
use veriface_verify::HttpVerifier;
use veriface_config::capture::CaptureConfig;
use veriface_vision::{FaceDetector, LiveFeed, NullDetector, OnnxFaceDetector, ReplaySource};

pub mod capture_context;
pub mod controller;
pub mod detection;
pub mod events;
pub mod state;
pub mod ui;

#[cfg(test)]
mod tests;

use self::controller::AppController;
use self::state::AppState;

/// Live face capture with remote verification
#[derive(Parser, Debug)]
#[command(name = "veriface", version)]
struct Cli {
    /// JSON config file; environment variables are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verification server base URL (requests go to <url>/verify)
    #[arg(long)]
    server_url: Option<String>,

    /// Start with auto-capture enabled
    #[arg(long)]
    auto_send: bool,

    /// Image file or directory replayed as the video source
    #[arg(long)]
    source: Option<PathBuf>,

    /// BlazeFace ONNX model used for the face overlay
    #[arg(long)]
    detector_model: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log_filter);

    // Model must be ready before the feed is attached
    let detector = build_detector(&config.capture);
    detector
        .load()
        .await
        .context("Failed to load face detector")?;

    let feed = Arc::new(LiveFeed::new());
    let state = Arc::new(AppState::new(config.clone(), feed.clone()));
    let verifier = Arc::new(HttpVerifier::new(config.network.verify_path.clone()));
    let controller = AppController::new(state, verifier);

    match &config.capture.source {
        Some(path) => {
            let path = PathBuf::from(path);
            let source = tokio::task::spawn_blocking(move || ReplaySource::open(&path))
                .await?
                .context("Failed to open video source")?;
            tracing::info!("Replaying {} frame(s) at {} fps", source.len(), config.capture.replay_fps);
            source.spawn(feed, config.capture.replay_fps, controller.child_token());
        }
        None => {
            tracing::warn!("No video source configured, captures are skipped until frames arrive");
        }
    }

    let mut tasks = controller.spawn_tasks(detector);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::info!("Session ended"),
                Ok(Err(e)) => tracing::error!("Task exited with error: {e:#}"),
                Err(e) => tracing::error!("Task panicked: {e}"),
            }
        }
    }

    controller.shutdown();
    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::warn!("Tasks did not stop in time, aborting");
        tasks.abort_all();
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::new(),
    };

    if let Some(url) = &cli.server_url {
        config.network.server_url = url.clone();
    }
    if cli.auto_send {
        config.auto_send = true;
    }
    if let Some(source) = &cli.source {
        config.capture.source = Some(source.display().to_string());
    }
    if let Some(model) = &cli.detector_model {
        config.capture.detector_model = Some(model.display().to_string());
    }

    Ok(config)
}

fn build_detector(capture: &CaptureConfig) -> Arc<dyn FaceDetector> {
    match &capture.detector_model {
        Some(model) => Arc::new(OnnxFaceDetector::new(model, capture.detector_confidence)),
        None => Arc::new(NullDetector),
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}
