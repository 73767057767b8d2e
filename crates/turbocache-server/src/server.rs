//! HTTP server for the remote cache API
//!
//! Artifact routes live under `/{api_version}/artifacts` and require a bearer
//! token. `/health` is open.

use crate::auth::require_token;
use crate::config::Config;
use crate::error::AppError;
use crate::types::{HealthResponse, StatusResponse, TeamQuery};
use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use turbocache_store::{EventRecord, Report, Storage};

/// Shared state for the HTTP server
pub struct ServerState {
    pub storage: Storage,
    pub tokens: Vec<String>,
    pub api_version: String,
    pub max_artifact_bytes: usize,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(storage: Storage, config: &Config) -> Self {
        Self {
            storage,
            tokens: config.tokens.clone(),
            api_version: config.api_version.clone(),
            max_artifact_bytes: config.max_artifact_bytes,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    let artifacts = Router::new()
        .route("/status", get(status))
        .route("/info", get(info))
        .route("/events", post(record_events))
        .route(
            "/{hash}",
            get(get_artifact).head(head_artifact).put(put_artifact),
        )
        .layer(DefaultBodyLimit::max(state.max_artifact_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health))
        .nest(&format!("/{}/artifacts", state.api_version), artifacts)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        started_at: state.started_at.to_rfc3339(),
    })
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse { status: "enabled" })
}

/// Cache savings summary for a team
async fn info(
    State(state): State<SharedState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Report>, AppError> {
    let team = query.team()?;
    Ok(Json(state.storage.summary(team).await))
}

/// Record a batch of client usage events
async fn record_events(
    State(state): State<SharedState>,
    Query(query): Query<TeamQuery>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let team = query.team()?;
    // A `null` body is an empty batch
    let events: Vec<EventRecord> = serde_json::from_slice::<Option<Vec<EventRecord>>>(&body)
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .unwrap_or_default();

    state.storage.record_events(team, &events).await?;
    debug!(team, count = events.len(), "Recorded events");

    Ok("Success. Event recorded.")
}

/// Existence check for an artifact
async fn head_artifact(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
    Query(query): Query<TeamQuery>,
) -> Result<StatusCode, AppError> {
    let team = query.team()?;

    if state.storage.artifact_exists(team, &hash).await? {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::NotFound("The artifact was not found".to_string()))
    }
}

/// Upload an artifact
async fn put_artifact(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
    Query(query): Query<TeamQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), AppError> {
    let team = query.team()?;

    let duration = header_str(&headers, "x-artifact-duration").unwrap_or_default();
    // Chunked uploads carry no Content-Length; record what was received instead
    let content_length = header_str(&headers, header::CONTENT_LENGTH.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.len().to_string());

    state
        .storage
        .store_artifact(team, &hash, &body, &content_length, duration)
        .await?;

    info!(team, hash = %hash, size = body.len(), "Stored artifact");
    Ok((StatusCode::ACCEPTED, "ok"))
}

/// Download an artifact
async fn get_artifact(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
    Query(query): Query<TeamQuery>,
) -> Result<Response, AppError> {
    let team = query.team()?;

    let data = match state.storage.fetch_artifact(team, &hash).await {
        Ok(data) => data,
        Err(e) if e.is_not_found() => {
            return Err(AppError::NotFound("The artifact was not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from(data),
    )
        .into_response())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
