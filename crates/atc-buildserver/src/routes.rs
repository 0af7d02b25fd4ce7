//! Routing glue: maps build ids to event streams
//!
//! No authentication or team scoping happens here; this only resolves the
//! build and delegates to [`EventStreamHandler`].

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::debug;

use atc_logging::StreamContext;
use atc_storage::BuildRegistry;

use crate::handler::{DEFAULT_CHANNEL_CAPACITY, EventStreamHandler, compression_layer};

/// Shared state for the build routes
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: BuildRegistry,
    pub channel_capacity: usize,
}

impl AppState {
    pub fn new(registry: BuildRegistry) -> Self {
        Self {
            registry,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// Build the server's router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/builds/{build_id}/events", get(build_events))
        .with_state(state)
        .layer(compression_layer())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn build_events(
    State(state): State<AppState>,
    Path(build_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(build) = state.registry.get(&build_id) else {
        debug!(build_id = %build_id, "Event stream requested for unknown build");
        return (StatusCode::NOT_FOUND, "build not found").into_response();
    };

    EventStreamHandler::new(Arc::new(build))
        .with_channel_capacity(state.channel_capacity)
        .serve(&headers, StreamContext::new().with_build(&build_id))
        .await
}
