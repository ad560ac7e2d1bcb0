//! Item Store - A small CRUD REST service backed by Redis
//!
//! Serves the item REST API and the realtime relay socket.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use item_store::api::{create_router, AppState};
use item_store::config::Config;
use item_store::relay::{spawn_mqtt_bridge, RelayHub};
use item_store::store::ItemStore;

/// Main entry point for the item store server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to Redis (exit if no candidate answers), or use memory when configured
/// 4. Start the realtime relay (MQTT bridge when a broker is configured)
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "item_store=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Item Store Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, backend={:?}, redis_candidates={}, mqtt_broker={:?}, topic={}",
        config.server_port,
        config.store_backend,
        config.redis_urls.len(),
        config.mqtt.broker_host,
        config.mqtt.topic
    );

    let store = ItemStore::open(&config)
        .await
        .context("Could not connect to the Redis Service")?;
    info!("Item store initialized");

    let (relay, bridge_handle) = if config.mqtt.broker_host.is_some() {
        let (hub, commands) = RelayHub::bridged(config.mqtt.topic.clone());
        let handle = spawn_mqtt_bridge(&config.mqtt, hub.clone(), commands);
        (hub, handle)
    } else {
        info!("No MQTT broker configured, relay running in loopback mode");
        (RelayHub::loopback(config.mqtt.topic.clone()), None)
    };

    let app = create_router(AppState::new(store, relay));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(bridge_handle))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the MQTT bridge and allows graceful shutdown.
async fn shutdown_signal(bridge_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = bridge_handle {
        handle.abort();
        warn!("MQTT bridge aborted");
    }
}
