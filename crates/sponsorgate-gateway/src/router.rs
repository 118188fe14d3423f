//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/sponsor", post(transport::http::sponsor))
        .route("/v1/records/:id", get(transport::http::record))
        .route(
            "/v1/admin/gas",
            get(transport::admin::gas_stats).patch(transport::admin::toggle_sponsorship),
        )
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
