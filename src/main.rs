use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api_envelope::{
    api::{create_router, middleware::FilterOptions, AppState},
    config::LogFormat,
    Config,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Demo service for normalized error responses")]
struct Args {
    /// Address to listen on, overrides LISTEN_ADDR
    #[arg(short, long)]
    listen: Option<String>,

    /// Filter options file (.toml, .yaml or .yml), overrides ERROR_FILTER_CONFIG
    #[arg(short, long)]
    filter_config: Option<PathBuf>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env();
    init_tracing(config.log_format);
    info!("Starting api_envelope service");

    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(path) = args.filter_config.or_else(|| config.filter_config_path.clone()) {
        config.filter = FilterOptions::from_file(&path)
            .with_context(|| format!("loading filter options from {}", path.display()))?;
        info!(path = %path.display(), "filter_options_loaded");
    }
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        development = config.filter.is_development,
        sanitization = config.filter.sanitization_active(),
        "Configuration loaded and validated"
    );

    let state = AppState::new(config.filter.clone(), config.rate_tracking.clone());

    // Forget clients whose errors have aged out of the window
    let rate_tracker = state.rate_tracker.clone();
    let cleanup_interval = Duration::from_secs(config.rate_cleanup_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            rate_tracker.cleanup();
        }
    });

    let app = create_router(state);

    info!("Listening on {}", config.listen_addr);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
