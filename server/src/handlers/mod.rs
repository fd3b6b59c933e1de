use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::response::error;

pub mod events;

#[derive(Serialize)]
struct HealthPayload {
    success: bool,
    message: &'static str,
    timestamp: DateTime<Utc>,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        success: true,
        message: "Server is running!",
        timestamp: Utc::now(),
    };

    Json(payload).into_response()
}

#[derive(Serialize)]
struct Endpoints {
    health: &'static str,
    events: &'static str,
}

#[derive(Serialize)]
struct ServiceInfo {
    success: bool,
    message: &'static str,
    endpoints: Endpoints,
}

pub async fn service_info() -> Response {
    let info = ServiceInfo {
        success: true,
        message: "Social Events API",
        endpoints: Endpoints {
            health: "/health",
            events: "/api/events/upcoming",
        },
    };

    Json(info).into_response()
}

pub async fn route_not_found() -> Response {
    error("Route not found", StatusCode::NOT_FOUND)
}
