/*!
 * VetSched Core - Scheduling & Booking Backend
 *
 * Main application entry point for the Axum-based REST API server fronting
 * the staff console and the realtime voice-agent platform.
 */

// Module declarations
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod time_anchor;
mod utils;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use db::create_pool;
use middleware::cors::cors_from_env;
use middleware::error_redaction::redact_extractor_errors;
use middleware::security_headers::security_headers_middleware;
use routes::{create_api_v1_routes, create_voice_routes};
use services::{AvailabilityStore, BookingCoordinator, IntentGateway, SlotEngine, TracingEventPublisher};
use state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    timestamp: String,
    database: String,
}

/// API version info response
#[derive(Debug, Serialize, Deserialize)]
struct VersionResponse {
    name: String,
    version: String,
    git_commit: String,
    build_timestamp: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 && args[1] == "--health-check" {
        return perform_health_check().await;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug,axum::rejection=trace,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting VetSched Core API server...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");
    tracing::info!("Environment: {}", config.server.environment);

    let log_level = std::env::var("RUST_LOG").unwrap_or_default();
    if config.server.environment == "production"
        && (log_level.contains("debug") || log_level.contains("trace"))
    {
        tracing::warn!(
            "RUST_LOG={} in production environment — consider setting to 'info' or 'warn'",
            log_level
        );
    }

    let pool = create_pool(&config.database).await?;
    tracing::info!("Database connection pool created successfully");

    let store = Arc::new(AvailabilityStore::new(pool.clone()));
    let slot_engine = Arc::new(SlotEngine::new(store.clone()));
    let coordinator = Arc::new(BookingCoordinator::new(
        pool.clone(),
        store.clone(),
        Arc::new(TracingEventPublisher) as Arc<dyn services::EventPublisher>,
        config.booking.clone(),
    ));
    let gateway = Arc::new(IntentGateway::new(slot_engine.clone(), coordinator.clone()));

    let start_time = std::time::SystemTime::now();

    let app_state = AppState {
        pool: pool.clone(),
        store,
        slot_engine,
        coordinator,
        gateway,
        booking_config: config.booking.clone(),
    };

    let app = create_app(app_state, start_time);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("Invalid server address");

    tracing::info!("HTTP server listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the Axum application router
fn create_app(state: AppState, start_time: std::time::SystemTime) -> Router {
    let pool_for_health1 = state.pool.clone();
    let pool_for_health2 = state.pool.clone();
    let pool_for_health3 = state.pool.clone();

    Router::new()
        .route(
            "/health",
            get(move || health_handler(pool_for_health1.clone(), start_time)),
        )
        .route(
            "/api/health",
            get(move || health_handler(pool_for_health2.clone(), start_time)),
        )
        .route(
            "/healthz",
            get(move || health_handler(pool_for_health3.clone(), start_time)),
        )
        .route("/api/version", get(version_handler))
        .route("/", get(root_handler))
        .nest("/api/v1", create_api_v1_routes(state.clone()))
        .nest("/voice", create_voice_routes(state))
        .layer(cors_from_env())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(redact_extractor_errors))
        .layer(TraceLayer::new_for_http())
}

/// Root handler - API information
async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "VetSched Core API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Veterinary scheduling and booking core",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "api_v1": "/api/v1",
            "voice": "/voice"
        }
    }))
}

/// Health check handler
async fn health_handler(
    pool: sqlx::PgPool,
    start_time: std::time::SystemTime,
) -> impl IntoResponse {
    let uptime = start_time.elapsed().unwrap_or_default().as_secs();

    let db_status = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    };

    let response = HealthResponse {
        status: if db_status == "connected" {
            "healthy"
        } else {
            "unhealthy"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: db_status.to_string(),
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// Version info handler
async fn version_handler() -> impl IntoResponse {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_commit: env!("GIT_COMMIT").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
    })
}

/// Perform health check for container orchestration: a direct database ping,
/// no HTTP round-trip.
async fn perform_health_check() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let pool = create_pool(&config.database).await?;

    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => {
            println!("Health check passed");
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

// Unit tests removed - use integration tests in tests/ directory instead
