//! HTTP server for layer intersection checks.
//!
//! Accepts the polygon coordinates of a surveyed parcel and answers, for
//! every reference layer in the storage directory, whether the parcel
//! touches, overlaps, contains or lies within it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use couche::config::Config;
use couche::{Coordinate, EvaluateError, Evaluation, Evaluator};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Layer intersection server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Directory holding the layer files (overrides config)
    #[arg(long)]
    layers_dir: Option<PathBuf>,

    /// Evaluate layers one at a time
    #[arg(long)]
    sequential: bool,
}

/// Application state shared across handlers
struct AppState {
    evaluator: Evaluator,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(dir) = args.layers_dir {
        config.layers.dir = dir;
    }
    if args.sequential {
        config.evaluation.parallel = false;
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Couche Server");
    info!("Layer directory: {}", config.layers.dir.display());

    let evaluator = config.evaluator();
    info!("{} layers available", evaluator.list_layers().len());

    let state = Arc::new(AppState { evaluator });
    let app = router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/layers", get(layers_handler))
        .route("/analyze", post(analyze_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Couche server is running",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

/// List available layers
async fn layers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LayersResponse>, ApiError> {
    let evaluator = state.evaluator.clone();
    let layers = tokio::task::spawn_blocking(move || evaluator.list_layers())
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    Ok(Json(LayersResponse { layers }))
}

#[derive(Serialize)]
struct LayersResponse {
    layers: Vec<String>,
}

/// Check a polygon against every layer
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Evaluation>, ApiError> {
    let coordinates = request.into_coordinates();
    let evaluator = state.evaluator.clone();

    let evaluation = tokio::task::spawn_blocking(move || evaluator.evaluate(&coordinates))
        .await
        .map_err(|e| {
            tracing::error!("Evaluation task failed: {}", e);
            internal_error(e.to_string())
        })?
        .map_err(|e| match e {
            EvaluateError::InsufficientVertices { .. } | EvaluateError::InvalidPolygon(_) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { detail: e.to_string() }))
            }
        })?;

    Ok(Json(evaluation))
}

/// Either a bare coordinate list or `{"coordinates": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum AnalyzeRequest {
    Bare(Vec<Coordinate>),
    Wrapped { coordinates: Vec<Coordinate> },
}

impl AnalyzeRequest {
    fn into_coordinates(self) -> Vec<Coordinate> {
        match self {
            AnalyzeRequest::Bare(c) | AnalyzeRequest::Wrapped { coordinates: c } => c,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(detail: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: format!("Internal server error: {}", detail),
        }),
    )
}
