//! Governance endpoints (`/v1/admin/gas`).

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use sponsorgate_core::error::SponsorError;
use sponsorgate_core::protocol::SponsorshipToggle;

use super::reject;
use crate::app_state::AppState;

/// `GET /v1/admin/gas`
pub async fn gas_stats(State(app): State<AppState>) -> Response {
    match app.gateway().gas_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => reject(&e, None),
    }
}

/// `PATCH /v1/admin/gas`
pub async fn toggle_sponsorship(
    State(app): State<AppState>,
    body: Result<Json<SponsorshipToggle>, JsonRejection>,
) -> Response {
    let toggle = match body {
        Ok(Json(t)) => t,
        Err(e) => {
            let err = SponsorError::BadRequest(format!("invalid toggle: {}", e.body_text()));
            return reject(&err, None);
        }
    };

    match app
        .gateway()
        .set_sponsorship(&toggle.wallet_address, toggle.is_active)
        .await
    {
        Ok(status) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "walletAddress": toggle.wallet_address,
                "status": status,
            })),
        )
            .into_response(),
        Err(e) => reject(&e, None),
    }
}
