mod api;
mod probe_cmd;
mod run_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use flatframe_config::StudioConfig;
use flatframe_core::{DisplayHandles, StudioError};
use flatframe_generation::GenerationClient;
use flatframe_media::{FfmpegFrameExtractor, HandleRegistry};
use flatframe_studio::Studio;

use api::AppState;

#[derive(Parser)]
#[command(name = "flatframe")]
#[command(about = "flatframe: restyle a video as a flat vector animation")]
#[command(version)]
struct Cli {
    /// Config file (defaults to FLATFRAME_CONFIG, then <config dir>/flatframe/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stylize one video and save the result as vector_animation.mp4
    Run {
        /// Input video
        video: PathBuf,
        /// Directory to write the result into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the HTTP API and media previews
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Extract the first frame of a video as JPEG
    Probe {
        /// Input video
        video: PathBuf,
        /// Where to write the snapshot
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { video, output } => {
            let config = flatframe_config::load(config_path).await?;
            flatframe_logging::init_console_logger(&config.log_level);
            run_cmd::run(&config, &video, output).await?;
        }
        Commands::Serve { port, bind } => {
            let config = flatframe_config::load(config_path).await?;
            flatframe_logging::init_logger(&config.log_dir, &config.log_level);
            let config = StudioConfig {
                port: port.unwrap_or(config.port),
                bind_address: bind.unwrap_or(config.bind_address),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Probe { video, output } => {
            let config = flatframe_config::load_unvalidated(config_path).await?;
            flatframe_logging::init_console_logger(&config.log_level);
            probe_cmd::run(&config, &video, output).await?;
        }
    }

    Ok(())
}

/// Wire the ffmpeg extractor and the remote generator into a studio.
pub(crate) fn build_studio(
    config: &StudioConfig,
    handles: Arc<dyn DisplayHandles>,
) -> Result<Studio, StudioError> {
    let extractor = FfmpegFrameExtractor::new(&config.ffmpeg_path, &config.ffprobe_path);
    let generator = GenerationClient::from_config(config)?;
    info!(
        model = %generator.model(),
        poll_interval_secs = config.poll_interval_secs,
        "Generation client ready"
    );
    Ok(Studio::new(Arc::new(extractor), Arc::new(generator), handles))
}

async fn run_server(config: StudioConfig) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        model = %config.model,
        "Starting flatframe server"
    );
    debug!(
        config = %flatframe_config::redact(&serde_json::to_value(&config)?),
        "Effective config"
    );

    let handles = Arc::new(HandleRegistry::new(api::MEDIA_BASE_PATH));
    let studio = build_studio(&config, handles.clone())?;

    let app_state = Arc::new(AppState {
        studio: studio.clone(),
        handles,
    });

    let app = api::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    let addr = format!("{}:{}", config.bind_address, config.port);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            studio.shutdown();
        })
        .await?;

    Ok(())
}
