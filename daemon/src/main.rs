use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use vocmdd::config::load_config;
use vocmdd::server::DaemonServer;
use vocmdd::state::DaemonState;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    let level = config
        .logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("vocmd daemon (vocmdd) starting...");

    let socket_path = config.server.socket_path.clone();
    let read_buffer_bytes = config.server.read_buffer_bytes;
    let state = Arc::new(Mutex::new(DaemonState::new(config)));

    let server = DaemonServer::new(socket_path, state).with_read_buffer(read_buffer_bytes);
    server.run().await?;

    Ok(())
}
