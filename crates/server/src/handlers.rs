//! HTTP route handlers.
//!
//! Storage work runs on the blocking pool: ingests under the engine's write
//! lock, queries under its read lock.

use std::sync::{Arc, RwLock};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveTime;
use config::AccessWindow;
use engine::{Engine, EngineError};
use recordlog::{DateKey, Reading};
use serde::Deserialize;

use crate::error::ApiError;

/// Time-of-day source for the access gate.
pub type Clock = Arc<dyn Fn() -> NaiveTime + Send + Sync>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<Engine>>,
    pub access: AccessWindow,
    pub clock: Clock,
}

impl AppState {
    /// State gated by the local wall clock.
    pub fn new(engine: Engine, access: AccessWindow) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            access,
            clock: Arc::new(|| chrono::Local::now().time()),
        }
    }

    /// Replaces the clock, e.g. with a fixed time in tests.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }
}

/// Body of `PUT/POST /receive`.
#[derive(Debug, Deserialize)]
pub struct ReceiveRequest {
    pub datetime: String,
    pub plate_number: String,
    pub speed_kmph: f64,
}

/// Query string of `GET /query`.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub date: Option<String>,
    pub speed_kmph: Option<String>,
}

/// Handle PUT|POST /receive
///
/// Stores one reading and echoes it back.
pub async fn handle_receive(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Reading>, ApiError> {
    let req: ReceiveRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;

    let record = write_engine(&state, move |engine| {
        engine.ingest_raw(&req.datetime, &req.plate_number, req.speed_kmph)
    })
    .await?;

    Ok(Json(record.reading))
}

/// Handle GET /query
///
/// With a finite `speed_kmph`, returns every reading of `date` above it,
/// newest first. Otherwise returns `[min, max]`, or `[]` for a date with no
/// readings.
pub async fn handle_query(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let now = (state.clock)();
    if !state.access.allows(now) {
        return Err(ApiError::Forbidden(state.access));
    }

    let raw_date = params
        .date
        .as_deref()
        .ok_or_else(|| ApiError::from("missing 'date' query parameter"))?;
    let date: DateKey = raw_date
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid 'date': {e}")))?;

    let threshold = params
        .speed_kmph
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|t| t.is_finite());

    let readings = match threshold {
        Some(t) => read_engine(&state, move |engine| engine.query_threshold(&date, t)).await?,
        None => read_engine(&state, move |engine| {
            Ok(engine
                .query_extremes(&date)?
                .map(|ext| vec![ext.min, ext.max])
                .unwrap_or_default())
        })
        .await?,
    };

    tracing::debug!(%date, ?threshold, results = readings.len(), "query served");
    Ok(Json(readings))
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn read_engine<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Engine) -> Result<T, EngineError> + Send + 'static,
{
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || {
        let guard = engine
            .read()
            .map_err(|_| ApiError::Internal("engine lock poisoned".to_string()))?;
        f(&guard).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}

async fn write_engine<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut Engine) -> Result<T, EngineError> + Send + 'static,
{
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = engine
            .write()
            .map_err(|_| ApiError::Internal("engine lock poisoned".to_string()))?;
        f(&mut guard).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}
