use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::time::Duration;

use tracing::info;

use tower_http::services::ServeDir;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, OriginalUri, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{log_requests, metrics::metrics_handler, state::*, ServerConfig};
use crate::simulation::{SimulateRequest, ValidateRequest};

const HEALTH_MESSAGE: &str = "Hair Simulation API is live";

#[derive(Serialize)]
struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub uptime: String,
    pub hash: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    pub success: bool,
    pub result_image: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let message: String = message.into();
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Malformed or oversized JSON bodies, reported in the API's own envelope.
fn reject_body(rejection: JsonRejection) -> Response {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    failure(status, rejection.body_text())
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        message: HEALTH_MESSAGE,
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    })
}

async fn validate(
    State(simulator): State<GuardedSimulator>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return reject_body(rejection),
    };
    match simulator.validate(request).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn simulate(
    State(simulator): State<GuardedSimulator>,
    body: Result<Json<SimulateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return reject_body(rejection),
    };
    match simulator.simulate(request).await {
        Ok(result) => Json(SimulateResponse {
            success: true,
            result_image: result.to_string(),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn api_not_found(OriginalUri(uri): OriginalUri) -> Response {
    failure(
        StatusCode::NOT_FOUND,
        format!("API route not found: {}", uri),
    )
}

pub fn make_app(config: ServerConfig, simulator: GuardedSimulator) -> Result<Router> {
    let state = ServerState::new(config.clone(), simulator);

    let api_routes: Router = Router::new()
        .route("/v1/validate", post(validate))
        .route("/v1/simulate", post(simulate))
        .route("/health", get(health))
        .fallback(api_not_found)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(health))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router.nest("/api", api_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(config: ServerConfig, simulator: GuardedSimulator) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, simulator)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            info!("HTTP server stopped: {:?}", result);
            Ok(result?)
        },
        result = axum::serve(metrics_listener, make_metrics_app()).into_future() => {
            info!("Metrics server stopped: {:?}", result);
            Ok(result?)
        },
    }
}
