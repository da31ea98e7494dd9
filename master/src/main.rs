mod config;
mod coordinator;
mod handlers;
mod ledger;
mod monitor;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{expand_inputs, MasterConfig};
use crate::coordinator::Coordinator;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("master=debug,tower_http=info")),
        )
        .init();

    let config = MasterConfig::parse();
    let inputs = expand_inputs(&config.inputs)?;
    info!(
        "job con {} splits, {} reduces, timeout de tarea {:?}",
        inputs.len(),
        config.n_reduce,
        config.task_timeout()
    );

    let state = AppState::new(Coordinator::new(
        inputs,
        config.n_reduce,
        config.task_timeout(),
    ));

    // router HTTP
    let app = handlers::build_router(state.clone());

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.bind))?;
    info!("master escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(monitor::shutdown_signal(state.clone(), config.linger()))
        .await
        .context("error en el server HTTP")?;

    let phase = state.coordinator.lock().unwrap().phase();
    info!("master terminado (fase {:?})", phase);
    Ok(())
}
