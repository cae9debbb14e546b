mod config;
mod http;
mod state;

use anyhow::Context;
use dotenvy::dotenv;
use registry::StaticRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use config::Settings;
use http::router::build_router;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::new().context("Failed to load configuration")?;

    // 注册表读不到直接启动失败，不做任何探测或发送
    let registry = Arc::new(
        StaticRegistry::load(&settings.registry.path)
            .context("Failed to load the community registry")?,
    );

    let (tx_cmd, rx_cmd) = mpsc::channel(100);

    use matrix_sdk::ruma::UserId;
    let user_id = UserId::parse(&settings.matrix.user)
        .map_err(|e| anyhow::anyhow!("Invalid Matrix user ID: {}", e))?;

    let bot_config = adapter::BotConfig {
        homeserver_url: settings.matrix.homeserver_url.clone(),
        user_id,
        access_token: settings.matrix.token.clone(),
        device_id: settings.matrix.device_id.clone(),
        user_template: settings.matrix.user_template.clone(),
        command_prefix: settings.matrix.command_prefix.clone(),
        scan_deadline: Duration::from_secs(settings.engine.scan_deadline_secs),
    };

    let cancel_token = CancellationToken::new();
    let worker_cancel = cancel_token.clone();
    let worker_registry = registry.clone();

    tokio::spawn(async move {
        if let Err(e) = adapter::start(bot_config, worker_registry, rx_cmd, worker_cancel).await {
            tracing::error!("Matrix worker crashed: {:?}", e);
        }
    });

    let state = AppState {
        sender: tx_cmd,
        trigger_token: settings.security.trigger_token.clone(),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }

    cancel_token.cancel();
}
