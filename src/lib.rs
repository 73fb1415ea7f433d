//! Gompa - REST backend for a monastery heritage platform
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Itinerary, story, monk, event, education endpoints       │
//! │  - Chatbot and preservation proxies                         │
//! │  - Admin dashboard and metrics                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Itinerary planner                                        │
//! │  - Story moderation workflow                                │
//! │  - Chat rate limiter                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Static monastery catalog                                 │
//! │  - Local media storage                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database, models and the monastery catalog
//! - `storage`: Story media on the local filesystem
//! - `auth`: Session tokens, identities and role checks
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the database pool, the HTTP client
/// and the chat rate limiter.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Story media storage
    pub storage: Arc<storage::MediaStorage>,

    /// HTTP client for the AI assistant and the image comparison service
    pub http_client: Arc<reqwest::Client>,

    /// Process-wide limiter in front of the AI assistant
    pub chat_limiter: Arc<service::ChatRateLimiter>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database and run migrations
    /// 2. Prepare the media directory
    /// 3. Build the outbound HTTP client
    /// 4. Create the chat rate limiter
    /// 5. Ensure the bootstrap admin exists
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Prepare media storage
        let storage = storage::MediaStorage::new(&config.storage).await?;
        tracing::info!(dir = %config.storage.media_dir.display(), "Media storage initialized");

        // 3. Initialize HTTP client; per-call timeouts are set by each service
        let http_client = reqwest::Client::builder()
            .user_agent("Gompa/0.1.0")
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        // 4. Chat rate limiter
        let chat_limiter = service::ChatRateLimiter::from_config(&config.chatbot);
        if config.chatbot.api_key().is_none() {
            tracing::warn!("No chatbot API key configured; chat requests will be refused");
        }

        // 5. Initialize admin user
        Self::ensure_admin_user(&db, &config).await?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            storage: Arc::new(storage),
            http_client: Arc::new(http_client),
            chat_limiter: Arc::new(chat_limiter),
        })
    }

    /// Ensure the bootstrap admin exists with the configured name
    ///
    /// An existing user with the admin email is promoted if needed.
    async fn ensure_admin_user(
        db: &data::Database,
        config: &config::AppConfig,
    ) -> Result<(), error::AppError> {
        let admin_role = auth::Role::Admin.as_str();

        if let Some(user) = db.get_user_by_email(&config.admin.email).await? {
            if user.name != config.admin.name || user.role != admin_role {
                db.update_user(&user.id, &config.admin.name, admin_role)
                    .await?;
                tracing::info!(email = %user.email, "Admin account updated");
            } else {
                tracing::info!(email = %user.email, "Admin account exists");
            }
            return Ok(());
        }

        tracing::info!("Creating admin account...");

        let user = data::User {
            id: data::EntityId::new().0,
            name: config.admin.name.clone(),
            email: config.admin.email.trim().to_string(),
            role: admin_role.to_string(),
            stories_count: 0,
            photos_count: 0,
            videos_count: 0,
            created_at: chrono::Utc::now(),
        };
        db.insert_user(&user).await?;

        tracing::info!(
            id = %user.id,
            email = %user.email,
            "Admin account created"
        );

        Ok(())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit, middleware};
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
        services::ServeDir, trace::TraceLayer,
    };

    // Two images plus form fields must fit for preservation comparisons
    let body_limit = state.storage.max_upload_bytes() * 2 + 1024 * 1024;
    let uploads = ServeDir::new(state.storage.root());

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::itinerary_router(state.clone()))
        .merge(api::stories_router())
        .merge(api::monks_router())
        .merge(api::events_router())
        .merge(api::education_router())
        .merge(api::chatbot_router())
        .merge(api::preservation_router())
        .merge(api::admin_router())
        .route_layer(middleware::from_fn(api::track_metrics))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
