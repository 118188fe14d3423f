use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use sponsorgate_core::error::SponsorError;
use sponsorgate_core::protocol::{SponsorAccepted, SponsorRequest};

use super::reject;
use crate::app_state::AppState;

/// `POST /v1/sponsor`
pub async fn sponsor(
    State(app): State<AppState>,
    body: Result<Json<SponsorRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            let err = SponsorError::BadRequest(format!("invalid request: {}", e.body_text()));
            return reject(&err, None);
        }
    };

    match app.gateway().admit(req).await {
        Ok(s) => (
            StatusCode::OK,
            Json(SponsorAccepted {
                success: true,
                execution_hash: s.receipt.execution_hash,
                operation_hash: s.receipt.operation_hash,
                sponsored: true,
                remaining_quota: s.remaining_quota,
                record_id: s.record.id,
            }),
        )
            .into_response(),
        Err(r) => reject(&r.error, r.record_id),
    }
}

/// `GET /v1/records/:id`
pub async fn record(
    State(app): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let id = match id {
        Ok(Path(id)) => id,
        Err(e) => {
            let err = SponsorError::BadRequest(format!("invalid record id: {}", e.body_text()));
            return reject(&err, None);
        }
    };

    match app.gateway().record(id).await {
        Ok(Some(rec)) => (StatusCode::OK, Json(rec)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "error": "record not found",
                "code": "NOT_FOUND",
            })),
        )
            .into_response(),
        Err(e) => reject(&e, None),
    }
}
