//! # TeamTask API Server
//!
//! Team task management over HTTP: managers create and assign tasks and
//! administer accounts, team members follow and update the status of the
//! tasks assigned to them.
//!
//! ## Usage
//!
//! ```bash
//! STORE_BACKEND=memory JWT_SECRET=$(openssl rand -hex 32) cargo run -p teamtask-api
//! ```

use teamtask_api::{
    app::{build_router, connect_store, AppState},
    config::Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "teamtask_api=debug,teamtask_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.api.is_production());

    tracing::info!(
        "TeamTask API Server v{} starting in {} mode...",
        env!("CARGO_PKG_VERSION"),
        config.api.environment
    );

    let store = connect_store(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Store connection failed");
        e
    })?;
    tracing::info!(backend = store.backend(), "Store ready");

    let bind_address = config.bind_address();
    let state = AppState::new(store.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Store closed, exiting");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
