use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::app::AppState;

pub const SERVICE_NAME: &str = "telemetry-service";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    service: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    generator: GeneratorHealth,
}

/// Health of the telemetry generator
#[derive(Debug, Serialize)]
pub struct GeneratorHealth {
    status: String,
    cached_profiles: usize,
    noise_layers: Vec<&'static str>,
}

fn check_generator(state: &AppState) -> GeneratorHealth {
    let status = match state.generator.self_check() {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!(error = %e, "generator health check failed");
            "unhealthy"
        }
    };
    GeneratorHealth {
        status: status.to_string(),
        cached_profiles: state.generator.profiles().len(),
        noise_layers: state.generator.synthesizer().noise().layer_names(),
    }
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let generator = check_generator(&state);
    let healthy = generator.status == "healthy";

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        service: SERVICE_NAME,
        timestamp: chrono::Utc::now(),
        checks: HealthChecks { generator },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// GET /health/ready - Readiness probe
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /health/live - Liveness probe
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
