use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use savu_job_server::config::{AppConfig, AppState, MqttConfig, ServerConfig};
use savu_job_server::middleware::setup_logging;
use savu_job_server::queue::{spawn_pollers, QueueRegistry, RunnerFactory, RunnerKind};
use savu_job_server::routes::create_router;
use savu_job_server::services::{
    start_heartbeat, FileService, MqttService, NotificationHub, PluginService, SubscriptionService,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = setup_logging();

    tracing::info!("Starting application...");

    let app_config = AppConfig::from_env().context("failed to read application settings")?;
    let server_config = ServerConfig::load(&app_config.server_config)
        .with_context(|| format!("failed to load {}", app_config.server_config))?;
    let mqtt_config = MqttConfig::from_env().context("failed to read MQTT settings")?;

    tracing::info!("Loaded configuration for environment: {}", app_config.environment);

    if app_config.is_production() {
        for queue in server_config.queues.iter().filter(|q| q.runner == RunnerKind::Simulated) {
            tracing::warn!(queue = %queue.name, "Simulated runner configured in production");
        }
    }

    let shutdown = CancellationToken::new();

    let factory = RunnerFactory::with_builtin();
    let registry = Arc::new(QueueRegistry::from_config(&server_config.queues, &factory)?);
    tracing::info!(queues = ?registry.names(), "Queue registry created");

    let mirror = if mqtt_config.enabled {
        let service = MqttService::connect(&mqtt_config, shutdown.clone())?;
        tracing::info!(broker = %mqtt_config.broker, "MQTT status mirror enabled");
        Some(service)
    } else {
        None
    };

    let hub = Arc::new(NotificationHub::new());
    let subscriptions = SubscriptionService::new(registry.clone(), hub.clone()).with_mirror(mirror.clone());

    let plugins = PluginService::load(server_config.plugin_catalog.as_deref())?;
    let files = FileService::new(&server_config.files);

    let app_state = AppState::new(
        registry.clone(),
        subscriptions.clone(),
        files,
        plugins,
        server_config.paths.clone(),
    );

    let pollers = spawn_pollers(
        &registry,
        &subscriptions,
        Duration::from_secs(server_config.poll_interval_secs),
        &shutdown,
    );
    let heartbeat = start_heartbeat(
        hub.clone(),
        Duration::from_secs(server_config.heartbeat_secs.max(1)),
        shutdown.clone(),
    );

    let app = create_router(app_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = app_config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        "{} v{} is running on {}",
        app_config.app_name,
        app_config.app_version,
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone(), hub.clone()))
        .await?;

    for poller in pollers {
        if let Err(e) = poller.await {
            tracing::warn!("Status poller ended abnormally: {}", e);
        }
    }
    heartbeat.await.ok();

    registry.close_all().await;
    if let Some(mirror) = mirror {
        if let Err(e) = mirror.disconnect() {
            tracing::warn!("MQTT disconnect failed: {}", e);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM, then stop background tasks and close every socket.
async fn shutdown_signal(shutdown: CancellationToken, hub: Arc<NotificationHub>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
    hub.shutdown_all().await;
}
