use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, metrics_handler, time_handler};
use crate::rate_limit::rate_limit;
use crate::state::AppState;

/// Builds the service. `/health` and `/time` sit behind one shared limiter,
/// so a client's quota covers both; `/metrics` is left open.
pub fn build_router(state: Arc<AppState>) -> Router {
    let limited = Router::new()
        .route("/health", get(health_handler))
        .route("/time", get(time_handler))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ));

    Router::new()
        .merge(limited)
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
