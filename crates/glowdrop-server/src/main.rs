mod api;
mod middleware;

use std::sync::Arc;

use glowdrop_core::{CatalogStore, FeeSchedule};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AdminTokens,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = glowdrop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = glowdrop_core::load_catalog(config.reference_data_path.as_deref())?;
    tracing::info!(
        env = %config.env,
        postal_codes = catalog.index().postal_code_count(),
        areas = catalog.index().all_areas().len(),
        vendors = catalog.vendors().len(),
        "catalog loaded"
    );

    let store = CatalogStore::new(
        catalog,
        config.discovery_settings(),
        config.discovery_cache_max_entries,
    );
    let state = AppState {
        catalog: Arc::new(store),
        fees: Arc::new(FeeSchedule::default()),
        allowed_radii: Arc::new(config.allowed_radii.clone()),
    };

    let admin = AdminTokens::new(&config.admin_tokens);
    if admin.is_open() {
        tracing::warn!("GLOWDROP_ADMIN_TOKENS not set; catalog imports are unauthenticated");
    }
    let app = build_app(state, admin);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
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
