//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! Startup order matters: the chat table is created before the listener is
//! bound, so no request can reach a database without its schema. A failure
//! anywhere before `bind` aborts startup.

// region: --- Imports
use axum::{routing::{get, post}, Router};
use lib_core::{ChatRepository, Config, DbPool, create_pool, init_schema};
use crate::chat::{ChatHub, handle_chat_socket, handle_get_chats, handle_send_chat};
use crate::middleware::{log_requests, stamp_req, RequestStamp};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub hub: Arc<ChatHub>,
}

impl AppState {
    pub fn new(db: DbPool, hub: Arc<ChatHub>) -> Self {
        Self { db, hub }
    }
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ChatHub> {
    fn from_ref(state: &AppState) -> Self {
        state.hub.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000")
    pub bind_address: String,
    /// Allowed CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            bind_address: config.bind_address(),
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Install the global tracing subscriber.
///
/// Level comes from `LOG_LEVEL` (trace, debug, info, warn, error; default info).
pub fn init_tracing() -> anyhow::Result<String> {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {
            tracing_subscriber::EnvFilter::new(log_level.as_str())
        }
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(log_level)
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading or validation fails
/// - Database connection fails
/// - Schema creation fails
/// - Server binding fails
pub async fn start_server() -> anyhow::Result<()> {
    let log_level = init_tracing()?;
    info!(" CHAT RELAY STARTING");
    info!(" Log level: {}", log_level);

    info!("Loading configuration...");
    let app_config = Config::from_env()?;
    app_config.validate()?;
    let server_config = ServerConfig::from(&app_config);

    info!("Database URL: {}", app_config.database_url);
    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!(" Creating chat schema if absent...");
    init_schema(&pool).await?;
    let stored = ChatRepository::count(&pool).await?;
    info!(" Schema ready ({} stored messages)", stored);

    let hub = Arc::new(ChatHub::new(app_config.subscriber_buffer));
    info!(" Broadcast hub ready (buffer {} per subscriber)", app_config.subscriber_buffer);

    let state = AppState::new(pool.clone(), Arc::clone(&hub));
    let app = create_router(state, &server_config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_address).await?;

    info!(" SERVER READY: http://{}", server_config.bind_address);
    log_server_info();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&hub)))
        .await?;

    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    use axum::http::{header, HeaderValue, Method};

    let allow_origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/sendchat", post(handle_send_chat))
        .route("/getchats", get(handle_get_chats))
        .route("/socket", get(handle_chat_socket))
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
        )
        // Outside the logging and trace layers so both see the stamp
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

/// Resolve on Ctrl+C or SIGTERM, then end every realtime subscription.
async fn shutdown_signal(hub: Arc<ChatHub>) {
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, closing realtime connections...");
    hub.close_all().await;
}

/// Log server information
fn log_server_info() {
    info!(" CHAT:");
    info!("   • POST /sendchat   {{email, username, content}}");
    info!("   • GET  /getchats");
    info!(" REALTIME:");
    info!("   • GET  /socket     (WebSocket, \"chat message\" events)");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
