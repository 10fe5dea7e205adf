//! HTTP command handlers.
//!
//! One module per resource, each exposing its axum routes:
//! - `teams`: team creation and lookup
//! - `users`: activation, bulk deactivation, review listings
//! - `pull_requests`: create, merge, reassign
//! - `stats`: assignment statistics
//!
//! Every handler returns [`ApiErr`] on failure, which maps the error
//! taxonomy onto HTTP statuses and stable outcome codes.

pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Wrapper to make AppError usable as an axum error response.
#[derive(Debug)]
pub struct ApiErr(pub AppError);

impl ApiErr {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::TeamAlreadyExists { .. } => StatusCode::BAD_REQUEST,
            e if e.is_conflict() => StatusCode::CONFLICT,
            AppError::EmptyUserIds | AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_internal() {
            log::error!("[server] Request failed: {}", self.0);
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.code(),
                message: self.0.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

// ── Extractor helpers ────────────────────────────────────────────────────────

/// Unwrap a JSON body, turning malformed input into `INVALID_INPUT`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiErr> {
    let Json(value) = payload?;
    Ok(value)
}

/// Unwrap query parameters, turning missing ones into `INVALID_INPUT`.
pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiErr> {
    let Query(value) = params?;
    Ok(value)
}
