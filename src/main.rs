//! Gompa binary entry point

use gompa::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize metrics
/// 4. Initialize AppState
/// 5. Build Axum router
/// 6. Start background tasks (rate limiter pruning)
/// 7. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let default_filter = format!("gompa={},tower_http=debug", config.logging.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting Gompa..."
    );

    // 3. Initialize metrics
    gompa::metrics::init_metrics();

    // 4. Initialize application state
    let state = AppState::new(config.clone()).await?;

    // 5. Build Axum router
    let app = gompa::build_router(state.clone());

    // 6. Start background tasks
    spawn_limiter_prune_task(state.clone());

    // 7. Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn background task that drops expired chat limiter timestamps
fn spawn_limiter_prune_task(state: AppState) {
    let interval_secs = state.config.chatbot.prune_interval_seconds.max(1);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

        // Consume the immediate first tick
        interval.tick().await;

        loop {
            interval.tick().await;
            state.chat_limiter.prune_old().await;
            tracing::trace!("Chat limiter pruned");
        }
    });

    tracing::info!(interval_secs, "Chat limiter prune task spawned");
}
