//! Duet relay daemon.
//!
//! Pairs a host and a guest over WebSocket and relays playback events
//! between them.

use clap::Parser;
use duet_core::config::{MAX_SESSION_ID_LENGTH, MIN_SESSION_ID_LENGTH};
use duet_core::{ConnectionRouter, Outbox, RelayConfig, SessionRegistry};
use duet_http::{ServerOptions, SharedState};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

#[derive(Parser, Debug)]
#[command(name = "duet-daemon", version, about = "Two-party playback sync relay")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Length of generated session ids
    #[arg(
        long,
        default_value_t = duet_core::config::DEFAULT_SESSION_ID_LENGTH,
        value_parser = parse_id_length,
    )]
    session_id_length: usize,

    /// Serve static files from this directory for unmatched paths
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

fn parse_id_length(value: &str) -> Result<usize, String> {
    let length: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if (MIN_SESSION_ID_LENGTH..=MAX_SESSION_ID_LENGTH).contains(&length) {
        Ok(length)
    } else {
        Err(format!(
            "must be between {} and {}",
            MIN_SESSION_ID_LENGTH, MAX_SESSION_ID_LENGTH
        ))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let registry = Arc::new(Mutex::new(SessionRegistry::with_config(
        RelayConfig::with_session_id_length(args.session_id_length),
    )));
    let router = ConnectionRouter::new(registry, Arc::new(Outbox::new()));
    let state = Arc::new(SharedState::new(router));

    let options = ServerOptions {
        host: args.host,
        port: args.port,
        static_dir: args.static_dir,
    };

    match duet_http::run(options, state, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
