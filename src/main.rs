//! radgate binary: load configuration, wire the stage clients, serve the
//! portal API

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use radgate::config::Config;
use radgate::handlers::AppState;
use radgate::routes;

#[derive(Parser, Debug)]
#[command(name = "radgate")]
#[command(about = "Captive portal RADIUS + controller authentication bridge", long_about = None)]
struct Args {
    /// Config file path (default: config.toml, /etc/radgate/config.toml,
    /// ~/.config/radgate/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen port (overrides the configured port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let cfg = Config::load(args.config.as_deref())?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    cfg.validate()?;

    tracing::info!(
        "radgate v{} - Captive Portal Authentication Bridge",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        radius = %format!("{}:{}", cfg.radius.server_ip, cfg.radius.server_port),
        controller = %cfg.omada.base_url(),
        "upstreams configured"
    );

    let state = AppState::from_config(&cfg)?;
    let app = routes::router(state, &cfg.server.static_dir);

    let port = args.port.unwrap_or(cfg.server.port);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("captive portal listening on http://{addr}");

    axum::serve(listener, app).await.context("HTTP server error")?;
    Ok(())
}
