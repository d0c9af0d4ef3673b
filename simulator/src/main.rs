mod telemetry;

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::Parser;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use telemetry::Sensor;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Fake Aranet Cloud API for running the dashboard proxy locally.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, env = "SIM_PORT", default_value_t = 8090)]
    port: u16,

    /// Value the `ApiKey` header must carry
    #[arg(long, env = "ARANET_API_KEY", default_value = "dev-key")]
    api_key: String,

    /// Share of requests answered with 503
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    fail_rate: f64,

    #[arg(long, default_value_t = 4)]
    sensors: usize,
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{} is not within 0.0..=1.0", rate))
    }
}

struct SimState {
    api_key: String,
    fail_rate: f64,
    sensors: Vec<Sensor>,
}

#[derive(Debug, Deserialize)]
struct SensorQuery {
    sensor: Option<String>,
    points: Option<usize>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Aranet simulator");
    info!(
        "Port: {}, Sensors: {}, Fail rate: {}",
        args.port, args.sensors, args.fail_rate
    );

    let state = Arc::new(SimState {
        api_key: args.api_key,
        fail_rate: args.fail_rate,
        sensors: telemetry::sensors(args.sensors),
    });

    let app = Router::new()
        .route("/api/v1/sensors", get(get_sensors))
        .route("/api/v1/telemetry/last", get(get_telemetry_last))
        .route("/api/v1/telemetry/history", get(get_telemetry_history))
        .route("/api/v1/alarms/actual", get(get_alarms_actual))
        .route("/api/v1/measurements/last", get(get_measurements_last))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Simulator listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("HTTP server error: {}", e);
    }
}

/// Checks the API key, then injects failures at the configured rate.
async fn guard(State(state): State<Arc<SimState>>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == state.api_key);
    if !authorized {
        warn!("Rejected {} without a valid ApiKey", request.uri());
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid api key" })),
        )
            .into_response();
    }

    let fail = state.fail_rate > 0.0 && rand::thread_rng().gen_bool(state.fail_rate);
    if fail {
        debug!("Injecting failure for {}", request.uri());
        return (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response();
    }

    next.run(request).await
}

async fn get_sensors(State(state): State<Arc<SimState>>) -> impl IntoResponse {
    Json(json!({ "data": state.sensors }))
}

async fn get_telemetry_last(
    State(state): State<Arc<SimState>>,
    Query(query): Query<SensorQuery>,
) -> impl IntoResponse {
    let sensors = select(&state.sensors, query.sensor.as_deref());
    let samples = telemetry::telemetry_last(&mut rand::thread_rng(), &sensors);
    Json(json!({ "data": samples }))
}

async fn get_telemetry_history(
    State(state): State<Arc<SimState>>,
    Query(query): Query<SensorQuery>,
) -> Response {
    let Some(sensor) = query.sensor.or_else(|| state.sensors.first().map(|s| s.id.clone())) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "no sensors" }))).into_response();
    };
    let points = query.points.unwrap_or(48).min(1000);
    let samples = telemetry::telemetry_history(&mut rand::thread_rng(), &sensor, points, 5);
    Json(json!({ "data": samples })).into_response()
}

async fn get_alarms_actual(
    State(state): State<Arc<SimState>>,
    Query(query): Query<SensorQuery>,
) -> impl IntoResponse {
    let sensors = select(&state.sensors, query.sensor.as_deref());
    let alarms = telemetry::alarms(&mut rand::thread_rng(), &sensors);
    Json(json!({ "data": alarms }))
}

/// With no sensors configured this answers an empty batch.
async fn get_measurements_last(
    State(state): State<Arc<SimState>>,
    Query(query): Query<SensorQuery>,
) -> Response {
    let sensors = select(&state.sensors, query.sensor.as_deref());
    match sensors.first() {
        Some(sensor) => {
            Json(telemetry::measurements_last(&mut rand::thread_rng(), sensor)).into_response()
        }
        None => Json(json!({ "readings": [], "links": {} })).into_response(),
    }
}

fn select(sensors: &[Sensor], id: Option<&str>) -> Vec<Sensor> {
    match id {
        Some(id) => sensors.iter().filter(|s| s.id == id).cloned().collect(),
        None => sensors.to_vec(),
    }
}
