//! Route definitions for the Fitness Assistant web surface
//!
//! This module organizes all routes and applies middleware. The route
//! guard wraps every route, including the static assets, and skips the
//! excluded prefixes itself.

use crate::auth::route_guard;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod app;
mod auth;
mod health;
mod pages;


pub use app::app_routes;
pub use auth::{auth_routes, session_routes};

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config().server.assets_dir);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .merge(auth::auth_routes())
        .merge(app::app_routes())
        .nest("/api/v1/auth", auth::session_routes())
        .nest_service("/assets", assets)
        // Route guard runs inside the tracing/request-id layers
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
