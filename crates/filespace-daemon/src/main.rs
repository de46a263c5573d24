//! filespace-daemon: serves one identity's filespace over JSON-RPC.
//!
//! Single OS process running a Tokio async runtime. Clients communicate
//! with the daemon via newline-delimited JSON-RPC over a Unix socket.

mod commands;
mod config;
mod rpc;

use std::sync::Arc;

use filespace_core::Session;
use filespace_ledger::SqliteLedger;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// The identity's filespace session. Held for the whole of each command,
    /// so mutations never interleave.
    pub session: Mutex<Session<SqliteLedger>>,
    /// Configuration.
    pub config: DaemonConfig,
}

impl DaemonState {
    pub fn new(session: Session<SqliteLedger>, config: DaemonConfig) -> Self {
        Self {
            session: Mutex::new(session),
            config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("filespace={}", config.advanced.log_level)))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Filespace daemon starting");

    let identity = config.identity()?;
    let data_dir = DaemonConfig::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Open ledger
    let ledger_path = config.ledger_path();
    let ledger = SqliteLedger::new(filespace_ledger::open(&ledger_path)?)
        .with_contract_account(config.filespace.contract_account.as_str())
        .with_row_limit(config.ledger.row_limit);
    if !identity.public_key.is_empty() {
        ledger
            .register_account(&identity.account, &identity.public_key)
            .await?;
    }
    info!(path = ?ledger_path, "Ledger opened");

    // 4. Load the filespace, creating the root folder on first run
    let mut session = Session::new(ledger, identity, config.filespace.clone());
    if let Err(e) = session.resolve_root().await {
        warn!(error = %e, "Filespace not loaded at startup; retry with refresh_filespace");
    }

    let state = Arc::new(DaemonState::new(session, config));

    // 5. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 6. Run the RPC server until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
