use energy_analyzer_api::{
    api::{self, AppState},
    db,
    repositories::Stores,
    Config,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Starting energy-analyzer-api");

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(
        path = %cfg_path,
        cost_per_kwh = cfg.billing.cost_per_kwh,
        window = ?cfg.consumption.window,
        "Configuration loaded"
    );

    let stores = match &cfg.database {
        Some(db_cfg) => {
            let pool = db::connect(db_cfg).await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            info!("Connected to database");
            db::ensure_schema(&pool).await?;
            Stores::postgres(pool)
        }
        None => {
            warn!("No database configured, using in-memory store (data is lost on restart)");
            Stores::memory()
        }
    };

    if !cfg.auth.required {
        warn!("auth.required is false, protected routes accept anonymous requests");
    }

    let addr = cfg.bind_address();
    let router = api::create_router(AppState::new(stores, cfg));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("API server listening on {}", addr);

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "API server error");
    }

    info!("Application shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
