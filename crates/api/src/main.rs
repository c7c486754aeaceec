//! Queue-drain worker binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use courier_common::config::AppConfig;
use courier_engine::JobProcessor;
use courier_notifier::{SmtpTransport, TelegramNotifier};
use courier_queue::SheetsQueue;

use courier_api::gateway::TriggerGateway;
use courier_api::routes::create_router;
use courier_api::state::AppState;

/// Bot updates are small; anything larger is not a trigger.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting queue-drain worker...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Collaborator clients
    let queue = Arc::new(SheetsQueue::new(&config)?);
    let transport = Arc::new(SmtpTransport::new(&config)?);
    let notifier = Arc::new(TelegramNotifier::new(config.telegram_bot_token.clone())?);

    if config.webhook_token.is_none() {
        tracing::warn!("WEBHOOK_TOKEN is not set; the trigger endpoint accepts any caller");
    }

    // Build application state
    let processor = JobProcessor::new(queue, transport, notifier.clone());
    let gateway = TriggerGateway::new(processor, notifier);
    let port = config.port;
    let state = AppState::new(gateway, config);

    // Build router
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Worker stopped.");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "courier_api=info,courier_engine=info,courier_queue=info,courier_notifier=info,tower_http=info",
        )
    });

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal, stopping gracefully...");
}
