//! echo-binding: controller-side daemon.
//!
//! Connects to the relay, registers the configured identity and prints
//! every device command it receives. Real installations plug their own
//! [`CommandSink`](echo_binding::CommandSink) in through the library.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use echo_binding::{Connector, EventBusSink};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "echo-binding", about = "Controller binding for the echo relay")]
struct Args {
    /// Relay WebSocket URL, overrides `binding.address`.
    #[arg(long)]
    address: Option<String>,

    /// Identity to register, overrides `binding.identity`.
    #[arg(long)]
    identity: Option<String>,

    /// Seconds between keepalive pings.
    #[arg(long)]
    keepalive_secs: Option<u64>,

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

    let mut config = match echo_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("echo-binding: {e}");
            std::process::exit(1);
        }
    };
    if let Some(address) = args.address {
        config.binding.address = Some(address);
    }
    if let Some(identity) = args.identity {
        config.binding.identity = Some(identity);
    }
    if let Some(secs) = args.keepalive_secs {
        config.binding.keepalive_interval_secs = secs;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Err(e) = echo_config::validation::validate(&config) {
        eprintln!("echo-binding: {e}");
        std::process::exit(1);
    }

    let level = config.logging.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("echo_binding={level},echo_protocol={level}").into()
            }),
        )
        .init();

    let sink = Arc::new(EventBusSink::new(64));
    let mut events = sink.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::info!(thing = %event.target, command = ?event.command, hsb = ?event.hsb, "Device command");
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Device command log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let connector = Connector::new(sink);
    if let Err(e) = connector.initialize(&config.binding).await {
        tracing::error!(error = %e, "Could not connect to relay");
        std::process::exit(1);
    }

    let mut status = connector.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                tracing::debug!(status = %current, "Binding status");
            }
        }
    }

    connector.shutdown().await;
    tracing::info!("echo-binding stopped");
}
