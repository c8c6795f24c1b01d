mod config;
mod error;

use anyhow::Context;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use config::ApiConfig;
use cutlist_core::{IqDocument, OptimizationRequest, Optimizer, Solution};
use error::AppError;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(ApiConfig::from_env()?);
    info!(?config, "Starting cutting list API");

    let app = router(config.clone());

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.addr))?;

    info!("API server listening on http://{}", config.addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn router(config: Arc<ApiConfig>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/optimize", post(optimize))
        .route("/api/iq/optimize", post(optimize_iq))
        .with_state(config)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "cutlist-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Main optimization endpoint
async fn optimize(
    State(config): State<Arc<ApiConfig>>,
    Json(request): Json<OptimizationRequest>,
) -> Result<Json<Solution>, AppError> {
    info!(
        "Received optimization request with {} cut pieces and {} stock types",
        request.cut_pieces.len(),
        request.stock_pieces.len()
    );

    let optimizer = Optimizer::new(request)?;
    check_unit_budget(&optimizer, &config)?;

    let deadline = Instant::now() + config.optimize_timeout;
    let solution = run_with_budget(config.optimize_timeout, move || {
        optimizer.optimize_within(deadline)
    })
    .await??;

    info!(
        "Optimization complete: {} sheets, {} unplaceable, {:.2}% waste",
        solution.instances.len(),
        solution.unplaceable.len(),
        solution.display_waste_percentage()
    );

    Ok(Json(solution))
}

#[derive(Serialize)]
struct IqResponse {
    solution: Solution,
    document: IqDocument,
}

/// Imports an IQ document, optimizes it and returns the solution with the exported document
async fn optimize_iq(
    State(config): State<Arc<ApiConfig>>,
    Json(document): Json<IqDocument>,
) -> Result<Json<IqResponse>, AppError> {
    info!(
        "Received IQ document with {} parts and {} stock types",
        document.parts.len(),
        document.stock_pieces.len()
    );

    let import = document.import()?;
    let optimizer = import.optimizer()?;
    check_unit_budget(&optimizer, &config)?;

    let deadline = Instant::now() + config.optimize_timeout;
    let (solution, document) = run_with_budget(config.optimize_timeout, move || {
        optimizer.optimize_within(deadline).map(|solution| {
            let exported = import.export(&solution);
            (solution, exported)
        })
    })
    .await??;

    Ok(Json(IqResponse { solution, document }))
}

/// Rejects requests whose expanded demand exceeds the configured unit limit.
fn check_unit_budget(optimizer: &Optimizer, config: &ApiConfig) -> Result<(), AppError> {
    let requested = optimizer.unit_count();
    if requested > config.max_units {
        return Err(AppError::TooManyUnits {
            requested,
            limit: config.max_units,
        });
    }
    Ok(())
}

/// Runs a packing job off the async workers, giving up after `budget`.
/// Jobs also carry the same deadline, so one that is abandoned here stops on its own.
async fn run_with_budget<T, F>(budget: Duration, job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(budget, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(anyhow::Error::from(join_error).into()),
        Err(_) => Err(AppError::TimedOut(budget)),
    }
}
