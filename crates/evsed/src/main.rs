//! evsed - ISO 15118-20 charging station daemon
//!
//! Accepts V2G connections from EVs and runs one session engine per
//! connection.
//!
//! # Usage
//!
//! ```bash
//! ./evsed --config config/evsed.toml
//! ./evsed --listen 127.0.0.1:15118 --simulate
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use d20_engine::{Engine, SessionConfig};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use v2g_proto::{ExiCodec, SessionId};

mod config;
mod connection;
mod simulator;

use config::{EvsedConfig, SimulatorConfig};
use connection::Connection;

#[derive(Parser, Debug)]
#[command(name = "evsed")]
#[command(about = "ISO 15118-20 charging station daemon")]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Answer engine signals with a simulated charger
    #[arg(long)]
    simulate: bool,

    /// Enable debug output for all crates
    #[arg(short, long)]
    verbose: bool,
}

/// Shared by all connections of the daemon
struct Shared {
    session: Arc<SessionConfig>,
    codec: Arc<dyn ExiCodec>,
    simulator: Option<SimulatorConfig>,
    max_payload: u32,
    /// Id of the last paused session, offered for resumption once
    paused_session: Mutex<Option<SessionId>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "evsed=debug,d20_engine=debug,v2g_proto=debug"
    } else {
        "evsed=info,d20_engine=debug,v2g_proto=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting evsed");

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            EvsedConfig::load(path)?
        }
        None => {
            info!("No config file provided, using defaults");
            EvsedConfig::default()
        }
    };
    if let Some(listen) = args.listen {
        config.listener.address = listen;
    }
    if args.simulate {
        config.simulator.enabled = true;
    }

    info!(
        evse_id = %config.session.evse_id,
        services = ?config.session.supported_energy_services,
        codec = ?config.codec,
        simulator = config.simulator.enabled,
        "Session configuration"
    );

    let shared = Arc::new(Shared {
        codec: config.codec.build(),
        simulator: config.simulator.enabled.then(|| config.simulator.clone()),
        max_payload: config.listener.max_payload_bytes,
        session: Arc::new(config.session),
        paused_session: Mutex::new(None),
    });

    let listener = TcpListener::bind(config.listener.address).await?;
    info!("Listening on {}", config.listener.address);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "Accept failed");
                        continue;
                    }
                };
                let shared = shared.clone();
                let span = tracing::info_span!("connection", %peer);
                tokio::spawn(serve(shared, stream).instrument(span));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    Ok(())
}

async fn serve(shared: Arc<Shared>, stream: TcpStream) {
    info!("EV connected");
    if let Err(e) = stream.set_nodelay(true) {
        warn!(error = %e, "Failed to set TCP_NODELAY");
    }

    let mut engine = Engine::new(shared.session.clone(), shared.codec.clone());
    if let Some(id) = shared.paused_session.lock().take() {
        info!(session_id = %id, "Paused session may be resumed");
        engine = engine.with_previous_session(id);
    }

    let mut connection = Connection::new(stream, engine, shared.max_payload);
    if let Some(simulator) = &shared.simulator {
        connection = connection.with_simulator(simulator.clone());
    }

    match connection.run().await {
        Ok(end) => {
            info!(
                session_id = %end.session_id,
                terminated = end.terminated,
                paused = end.paused,
                "Connection closed"
            );
            if end.paused {
                *shared.paused_session.lock() = Some(end.session_id);
            }
        }
        Err(e) => error!(error = %format!("{e:#}"), "Connection aborted"),
    }
}
