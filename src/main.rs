use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use instagram_sync::config::Config;
use instagram_sync::db::Database;
use instagram_sync::instagram::{InstagramClient, MediaGateway};
use instagram_sync::sync::{sync_account_exclusive, SyncLocks, SyncOptions};
use instagram_sync::web::{self, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting instagram-sync");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        account_id = %config.account_id,
        base_url = %config.instagram_base_url,
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    let client = InstagramClient::new(config.instagram_settings())
        .context("Failed to initialize Instagram client")?;
    let gateway: Arc<dyn MediaGateway> = Arc::new(client);
    let sync_locks = SyncLocks::new();

    let state = AppState {
        db: db.clone(),
        config: Arc::new(config.clone()),
        gateway: Arc::clone(&gateway),
        sync_locks: sync_locks.clone(),
    };

    // Optional one-shot sync; failures are logged, the API still starts
    let startup_sync = if config.sync_on_startup {
        let options = SyncOptions {
            max_pages: config.sync_max_pages,
        };
        let account_id = config.account_id.clone();
        Some(tokio::spawn(async move {
            match sync_account_exclusive(&sync_locks, gateway.as_ref(), &db, &account_id, options)
                .await
            {
                Ok(processed) => info!(processed, "Startup sync finished"),
                Err(e) => warn!("Startup sync failed: {e}"),
            }
        }))
    } else {
        None
    };

    let mut web_handle = tokio::spawn(web::serve(state));

    // A server that stops on its own (bind failure, accept error) ends the process.
    let outcome = tokio::select! {
        () = shutdown_signal() => {
            info!("Shutting down...");
            web_handle.abort();
            Ok(())
        }
        joined = &mut web_handle => match joined {
            Ok(Ok(())) => Err(anyhow::anyhow!("Web server stopped unexpectedly")),
            Ok(Err(e)) => Err(e.context("Web server failed")),
            Err(e) => Err(anyhow::Error::new(e).context("Web server task panicked")),
        },
    };

    if let Some(handle) = startup_sync {
        handle.abort();
    }

    if outcome.is_ok() {
        info!("Shutdown complete");
    }

    outcome
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,instagram_sync=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
