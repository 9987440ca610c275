//! echo-relay: WebSocket relay between the voice backend and controller
//! bindings.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use echo_relay::RelayServer;

#[derive(Parser)]
#[command(name = "echo-relay", about = "WebSocket relay for echo controller bindings")]
struct Args {
    /// Port to listen on, overrides `relay.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind, overrides `relay.host`.
    #[arg(long)]
    host: Option<String>,

    /// Request path bindings connect to, overrides `relay.path`.
    #[arg(long)]
    path: Option<String>,

    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("echo-relay: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> echo_common::Result<()> {
    let mut config = echo_config::load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.relay.port = port;
    }
    if let Some(host) = args.host {
        config.relay.host = host;
    }
    if let Some(path) = args.path {
        config.relay.path = path;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    echo_config::validation::validate(&config)?;

    let level = config.logging.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("echo_relay={level},echo_protocol={level}").into()
            }),
        )
        .init();

    let server = RelayServer::bind(&config.relay).await?;
    let registry = server.registry();
    let shutdown = server.shutdown_token();

    // Periodic stats.
    let stats_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = stats_shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let sessions = registry.session_count().await;
                    let bindings = registry.binding_count().await;
                    tracing::debug!(sessions, bindings, "Registry stats");
                }
            }
        }
    });

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Ctrl-C received, shutting down"),
            Err(e) => tracing::warn!(error = %e, "Signal handler failed, shutting down"),
        }
        signal_shutdown.cancel();
    });

    server.run().await;
    Ok(())
}
