//! Process entry: flag parsing, one-time initialization, route
//! registration, serve.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier::config::{is_temp_cwd, load_config, Overrides};
use atelier::http::HttpServer;
use atelier::session::registry;
use atelier::AppState;

#[derive(Debug, Parser)]
#[command(name = "atelier", about = "Browser-accessible development environment server")]
struct Args {
    /// Path of the configuration file.
    #[arg(long, default_value = "conf/atelier.toml")]
    conf: PathBuf,

    /// Overwrite the configured bind host.
    #[arg(long)]
    ip: Option<String>,

    /// Overwrite the configured bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Overwrite the configured server address entirely.
    #[arg(long)]
    server: Option<String>,

    /// Overwrite the configured static asset host.
    #[arg(long)]
    static_server: Option<String>,

    /// Overwrite the configured context root.
    #[arg(long)]
    context: Option<String>,

    /// Overwrite the configured WebSocket channel address.
    #[arg(long)]
    channel: Option<String>,

    /// Report session statistics periodically.
    #[arg(long)]
    stat: bool,

    /// Running inside a container.
    #[arg(long)]
    docker: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let cwd = std::env::current_dir()?;
    if is_temp_cwd(&cwd) {
        tracing::error!(cwd = %cwd.display(), "refusing to run from the OS temp directory");
        std::process::exit(1);
    }

    let overrides = Overrides {
        ip: args.ip,
        port: args.port,
        server: args.server,
        static_server: args.static_server,
        context: args.context,
        channel: args.channel,
        docker: args.docker,
    };
    let config = load_config(&args.conf, &overrides)?;

    tracing::info!(
        server = %config.server,
        context = %config.context,
        users = config.users.len(),
        "Configuration loaded"
    );

    let state = AppState::new(config)?;

    // Initial catalog load; the pipeline refreshes it per request.
    state.catalog.reload()?;

    registry::spawn_sweeper(
        state.registry.clone(),
        Duration::from_secs(state.config.session_sweep_interval_secs),
        Duration::from_secs(state.config.session_idle_max_secs),
    );
    if args.stat {
        registry::spawn_reporter(
            state.registry.clone(),
            Duration::from_secs(state.config.stat_report_interval_secs),
        );
    }

    let listener = TcpListener::bind(&state.config.server).await?;

    let server = HttpServer::new(state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
