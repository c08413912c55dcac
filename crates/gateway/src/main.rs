//! Symposium API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use symposium_common::{
    auth::JwtManager,
    config::AppConfig,
    db::DbPool,
    metrics,
    storage::LocalFileStore,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub jwt: Arc<JwtManager>,
    pub files: Arc<LocalFileStore>,
}

// Required by the AuthContext extractor
impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .json()
        .init();

    info!("Starting Symposium API Gateway v{}", symposium_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .install()?;
        info!("Prometheus exporter listening on {}", metrics_addr);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Initialize file storage
    let files = Arc::new(LocalFileStore::new(&config.storage.upload_dir));
    files.ensure_root().await?;

    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        files,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Rate limiting
    let limiter = middleware::rate_limit::create_rate_limiter(
        state.config.rate_limit.requests_per_second,
        state.config.rate_limit.burst,
    );
    let rate_limit_enabled = state.config.rate_limit.enabled;

    // API routes
    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Account endpoints (no auth)
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // Public listing of approved articles
        .route("/publications", get(handlers::publications::list_publications))
        // User endpoints
        .route("/users", get(handlers::users::list_users))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/users/{id}", delete(handlers::users::delete_user))
        // Event endpoints
        .route("/events", post(handlers::events::create_event))
        .route("/events", get(handlers::events::list_events))
        .route("/events/{id}", get(handlers::events::get_event))
        .route("/events/{id}", put(handlers::events::update_event))
        .route("/events/{id}", delete(handlers::events::delete_event))
        .route("/events/{id}/evaluators", post(handlers::events::assign_evaluators))
        // File endpoints
        .route(
            "/files",
            post(handlers::files::upload_file)
                .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes)),
        )
        .route("/files/{file_ref}", get(handlers::files::download_file))
        // Article endpoints
        .route("/events/{id}/articles", post(handlers::articles::create_article))
        .route("/events/{id}/articles", get(handlers::articles::list_event_articles))
        .route(
            "/events/{id}/articles/review",
            get(handlers::articles::list_review_queue),
        )
        .route("/articles/{id}", get(handlers::articles::get_article))
        .route("/articles/{id}", put(handlers::articles::update_article))
        .route("/articles/{id}", delete(handlers::articles::delete_article))
        .route("/articles/{id}/status", put(handlers::articles::override_status))
        .route("/articles/{id}/versions", post(handlers::articles::submit_version))
        .route("/articles/{id}/versions", get(handlers::articles::list_versions))
        .route(
            "/articles/{id}/evaluations",
            get(handlers::articles::list_article_evaluations),
        )
        // Evaluation endpoints
        .route(
            "/versions/{id}/evaluations",
            post(handlers::evaluations::create_evaluation),
        )
        // Comment endpoints
        .route("/versions/{id}/comments", post(handlers::comments::create_comment))
        .route("/versions/{id}/comments", get(handlers::comments::list_comments))
        // Checklist endpoints
        .route("/events/{id}/checklist", post(handlers::checklists::create_checklist))
        .route("/events/{id}/checklist", get(handlers::checklists::get_checklist))
        .route(
            "/versions/{id}/checklist-answers",
            post(handlers::checklists::submit_answers),
        )
        .route(
            "/versions/{id}/checklist-answers",
            get(handlers::checklists::list_answers),
        );

    // Compose the app
    let mut app = Router::new()
        .nest("/v1", api_routes)
        .layer(axum::middleware::from_fn(
            middleware::request_metrics::track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id);

    if rate_limit_enabled {
        app = app.layer(axum::middleware::from_fn(move |request, next| {
            let limiter = limiter.clone();
            async move { middleware::rate_limit::rate_limit_middleware(request, next, limiter).await }
        }));
    }

    app.with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
