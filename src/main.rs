use anyhow::Result;
use axum::Router;
use synthetic_telemetry::{api, app::AppState, config::Config, observability};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    observability::init_tracing(&cfg.logging);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "Server binding to 0.0.0.0 - telemetry will be reachable from the network. \
            Bind to 127.0.0.1 unless behind a firewall/reverse proxy."
        );
    }

    let app_state = AppState::new(cfg)?;

    #[allow(unused_mut)]
    let mut app: Router = api::router(app_state);

    #[cfg(feature = "metrics")]
    {
        app = api::with_metrics(app);
    }

    info!(%addr, "starting telemetry service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(observability::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
