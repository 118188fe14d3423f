//! HTTP transport.
//!
//! JSON handlers for the sponsorship endpoint, record lookup, and the
//! governance views. Rejections map to HTTP status via `RejectCode`.

pub mod admin;
pub mod http;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};

use sponsorgate_core::error::SponsorError;
use sponsorgate_core::model::RecordId;
use sponsorgate_core::protocol::SponsorRejected;

pub(crate) fn status_of(err: &SponsorError) -> StatusCode {
    StatusCode::from_u16(err.code().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub(crate) fn reject(err: &SponsorError, record_id: Option<RecordId>) -> Response {
    (status_of(err), Json(SponsorRejected::from_error(err, record_id))).into_response()
}
