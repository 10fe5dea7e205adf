//! Pull request routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use super::{json_body, ApiErr};
use crate::models::{NewPullRequest, PullRequest};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequest,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequest,
    pub replaced_by: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pullRequest/create", post(create))
        .route("/pullRequest/merge", post(merge))
        .route("/pullRequest/reassign", post(reassign))
}

/// POST /pullRequest/create: create a PR and auto-assign reviewers.
async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiErr> {
    let input = json_body(payload)?;
    let pr = state.pull_requests.create(input).await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// POST /pullRequest/merge: mark a PR merged. Repeating it is harmless.
async fn merge(
    State(state): State<AppState>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let req = json_body(payload)?;
    let pr = state.pull_requests.merge(&req.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// POST /pullRequest/reassign: swap one reviewer for a teammate.
async fn reassign(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let req = json_body(payload)?;
    let (pr, replaced_by) = state
        .pull_requests
        .reassign(&req.pull_request_id, &req.old_user_id)
        .await?;
    Ok(Json(ReassignResponse { pr, replaced_by }))
}
