mod api;
mod middleware;

use std::time::Duration;

use anyhow::Context;
use knaps_core::TaxRate;
use knaps_db::Store;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = knaps_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = Store::new();
    if let Some(path) = &config.seed_path {
        let seed = knaps_core::load_seed(path)?;
        store
            .load_seed(seed)
            .await
            .with_context(|| format!("failed to load seed file {}", path.display()))?;
    }

    let default_tax_rate = TaxRate::new(config.default_tax_rate)?;
    let auth = AuthState::from_keys(&config.api_keys, config.is_development())?;
    let rate_limit = RateLimitState::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    let app = build_app(
        AppState {
            store,
            default_tax_rate,
        },
        auth,
        rate_limit,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "knaps server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
