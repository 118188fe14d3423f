//! sponsorgate binary.
//!
//! - `POST /v1/sponsor` admission endpoint
//! - governance views under `/v1/admin/gas`
//! - graceful shutdown: Ctrl-C flips `/readyz` to draining, then stops

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use sponsorgate_gateway::{app_state, config, router};

const DEFAULT_CONFIG: &str = "sponsorgate.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("SPONSORGATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.gateway.listen.parse()?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "sponsorgate starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    tracing::info!("sponsorgate stopped");
    Ok(())
}

async fn shutdown_signal(state: app_state::AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler failed");
    }
    state.metrics().set_draining();
    tracing::info!("draining");
}
