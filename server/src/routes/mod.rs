use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, SecurityHeadersLayer};
use crate::handlers::events::{
    create_event, get_event, join_event, list_created, list_joined, list_upcoming, update_event,
};
use crate::handlers::{health_check, route_not_found, service_info};
use crate::state::AppState;

pub fn create_routes(state: AppState, cors_origins: &[String], production: bool) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/api/events", post(create_event))
        .route("/api/events/upcoming", get(list_upcoming))
        .route("/api/events/user/created", get(list_created))
        .route("/api/events/user/joined", get(list_joined))
        .route("/api/events/:id", get(get_event).put(update_event))
        .route("/api/events/:id/join", post(join_event))
        .fallback(route_not_found)
        .layer(SecurityHeadersLayer::new(production))
        .layer(create_cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
