use crate::aranet::{
    AranetClient, ALARMS_ACTUAL_PATH, MEASUREMENTS_LAST_PATH, SENSORS_PATH,
    TELEMETRY_HISTORY_PATH, TELEMETRY_LAST_PATH,
};
use crate::errors::Error;
use crate::lookup::reshape_measurements;
use crate::metrics::{HTTP_REQUESTS_TOTAL, RESHAPE_FAILURES_TOTAL};
use crate::model::{ErrorResponse, HealthResponse, MeasurementsPayload, ReshapedMeasurements};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

type QueryPairs = Query<Vec<(String, String)>>;

#[derive(Debug, Clone)]
struct AppState {
    aranet: Arc<AranetClient>,
}

pub fn create_router(aranet: AranetClient) -> Router {
    let state = AppState {
        aranet: Arc::new(aranet),
    };

    Router::new()
        .route("/api/health", get(health))
        .route("/api/aranet/sensors", get(get_sensors))
        .route("/api/aranet/telemetry/last", get(get_telemetry_last))
        .route("/api/aranet/telemetry/history", get(get_telemetry_history))
        .route("/api/aranet/alarms/actual", get(get_alarms_actual))
        .route("/api/aranet/measurements", get(get_measurements))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    HTTP_REQUESTS_TOTAL.with_label_values(&["health"]).inc();
    Json(HealthResponse { ok: true })
}

async fn get_sensors(
    State(state): State<AppState>,
    Query(params): QueryPairs,
) -> Result<Json<Value>, AppError> {
    forward(&state, "sensors", SENSORS_PATH, &params).await
}

async fn get_telemetry_last(
    State(state): State<AppState>,
    Query(params): QueryPairs,
) -> Result<Json<Value>, AppError> {
    forward(&state, "telemetry_last", TELEMETRY_LAST_PATH, &params).await
}

async fn get_telemetry_history(
    State(state): State<AppState>,
    Query(params): QueryPairs,
) -> Result<Json<Value>, AppError> {
    forward(&state, "telemetry_history", TELEMETRY_HISTORY_PATH, &params).await
}

async fn get_alarms_actual(
    State(state): State<AppState>,
    Query(params): QueryPairs,
) -> Result<Json<Value>, AppError> {
    forward(&state, "alarms_actual", ALARMS_ACTUAL_PATH, &params).await
}

async fn get_measurements(
    State(state): State<AppState>,
    Query(params): QueryPairs,
) -> Result<Json<ReshapedMeasurements>, AppError> {
    HTTP_REQUESTS_TOTAL.with_label_values(&["measurements"]).inc();

    let raw: MeasurementsPayload = state.aranet.get(MEASUREMENTS_LAST_PATH, &params).await?;

    let reshaped = reshape_measurements(raw).inspect_err(|_| RESHAPE_FAILURES_TOTAL.inc())?;

    Ok(Json(reshaped))
}

/// Pass-through: upstream JSON is returned untouched.
async fn forward(
    state: &AppState,
    endpoint: &str,
    path: &str,
    params: &[(String, String)],
) -> Result<Json<Value>, AppError> {
    HTTP_REQUESTS_TOTAL.with_label_values(&[endpoint]).inc();
    let body = state.aranet.get::<Value>(path, params).await?;
    Ok(Json(body))
}

/// Every failure on the Aranet side is reported to the dashboard as a bad
/// gateway.
struct AppError(Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("API error: {}", self.0);
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}
