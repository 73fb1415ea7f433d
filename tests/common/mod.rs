//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod schema_validator;

use gompa::auth::{Role, Session, create_session_token};
use gompa::data::{EntityId, Monk, User};
use gompa::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@test.example.com";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Configuration used by every test server
///
/// Outbound collaborators point at a closed port unless a test overrides them.
pub fn test_config(temp_dir: &TempDir) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: config::DatabaseConfig {
            path: temp_dir.path().join("test.db"),
        },
        auth: config::AuthConfig {
            session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
            session_max_age: 604800,
        },
        admin: config::AdminConfig {
            name: "Test Admin".to_string(),
            email: ADMIN_EMAIL.to_string(),
        },
        storage: config::StorageConfig {
            media_dir: temp_dir.path().join("uploads"),
            public_url: "http://media.test.example.com/uploads".to_string(),
            max_upload_bytes: 1024 * 1024,
        },
        chatbot: config::ChatbotConfig {
            api_key: None,
            api_url: "http://127.0.0.1:9/models".to_string(),
            model: "test-model".to_string(),
            timeout_seconds: 5,
            max_requests_per_window: 10,
            window_seconds: 60,
            quota_cooldown_seconds: 60,
            prune_interval_seconds: 60,
        },
        preservation: config::PreservationConfig {
            service_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 5,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(configure: impl FnOnce(&mut config::AppConfig)) -> Self {
        // Create temporary directory for test database and uploads
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        configure(&mut config);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = gompa::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Sign a bearer token for an identity
    pub fn token_for(&self, identity_id: &str, role: Role) -> String {
        let session = Session::new(identity_id, role, 3600);
        create_session_token(&session, &self.state.config.auth.session_secret)
            .expect("Failed to create test token")
    }

    /// Token for the bootstrap admin created at start-up
    pub async fn admin_token(&self) -> String {
        let admin = self
            .state
            .db
            .get_user_by_email(ADMIN_EMAIL)
            .await
            .unwrap()
            .expect("bootstrap admin exists");
        self.token_for(&admin.id, Role::Admin)
    }

    /// Create a regular user and return it with a token
    pub async fn create_user(&self, name: &str) -> (User, String) {
        let user = User {
            id: EntityId::new().0,
            name: name.to_string(),
            email: format!("{}@test.example.com", name.to_lowercase()),
            role: "user".to_string(),
            stories_count: 0,
            photos_count: 0,
            videos_count: 0,
            created_at: chrono::Utc::now(),
        };
        self.state.db.insert_user(&user).await.unwrap();
        let token = self.token_for(&user.id, Role::User);
        (user, token)
    }

    /// Create a monk and return it with a token
    pub async fn create_monk(&self, name: &str, monastery: &str) -> (Monk, String) {
        let now = chrono::Utc::now();
        let monk = Monk {
            id: EntityId::new().0,
            name: name.to_string(),
            email: format!("{}@monastery.example.com", name.to_lowercase()),
            monastery: monastery.to_string(),
            bio: None,
            total_posts: 0,
            stories_count: 0,
            photos_count: 0,
            videos_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.state.db.insert_monk(&monk).await.unwrap();
        let token = self.token_for(&monk.id, Role::Monk);
        (monk, token)
    }
}

/// Serve a stand-in for an outbound collaborator and return its base URL
pub async fn spawn_upstream(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
