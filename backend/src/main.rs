//! Crop Stress Monitoring Platform - Backend Server
//!
//! Ingests daily remote-sensing and weather observations, derives temporal
//! features and stress labels, trains a water-stress classifier, and serves
//! predictions from manual values or field coordinates.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod model;
mod models;
mod routes;
mod services;

pub use config::Config;

use error::{AppError, AppResult};
use external::NasaPowerClient;
use model::StressModel;

/// Application state shared across handlers
///
/// The trained model is read-mostly: prediction handlers clone the inner
/// `Arc` out of a short read lock, and a completed training run swaps the
/// slot under the write lock.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub satellite: NasaPowerClient,
    pub model: Arc<RwLock<Option<Arc<StressModel>>>>,
}

impl AppState {
    /// Snapshot of the currently served model, or a 503 if none is trained.
    pub async fn current_model(&self) -> AppResult<Arc<StressModel>> {
        self.model
            .read()
            .await
            .clone()
            .ok_or(AppError::ModelNotTrained)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "csm_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Crop Stress Monitoring Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    // Load the trained artifact if one exists; the server starts without a
    // model and answers predictions with 503 until one is trained.
    let model = match StressModel::load(&config.model.artifact_path) {
        Ok(model) => {
            tracing::info!(
                "Loaded trained model: {} features, accuracy {:.3}",
                model.feature_names.len(),
                model.metrics.accuracy
            );
            Some(Arc::new(model))
        }
        Err(err) => {
            tracing::warn!(
                "No trained model at {}: {} (train one via POST /api/v1/training/runs)",
                config.model.artifact_path,
                err
            );
            None
        }
    };

    // Create application state
    let state = AppState {
        db: db_pool,
        satellite: NasaPowerClient::new(config.satellite.api_endpoint.clone()),
        config: Arc::new(config.clone()),
        model: Arc::new(RwLock::new(model)),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Crop Stress Monitoring Platform API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
