//! User routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use super::{json_body, query_params, ApiErr};
use crate::models::{BulkDeactivateResponse, User, UserReviews};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeactivateRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/bulkDeactivate", post(bulk_deactivate))
        .route("/users/getReview", get(get_review))
}

/// POST /users/setIsActive: activate, or deactivate with reviewer cascade.
async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErr> {
    let req = json_body(payload)?;
    let user = state.users.set_active(&req.user_id, req.is_active).await?;
    Ok(Json(UserResponse { user }))
}

/// POST /users/bulkDeactivate: deactivate many users concurrently.
async fn bulk_deactivate(
    State(state): State<AppState>,
    payload: Result<Json<BulkDeactivateRequest>, JsonRejection>,
) -> Result<Json<BulkDeactivateResponse>, ApiErr> {
    let req = json_body(payload)?;
    let response = state.users.bulk_deactivate(req.user_ids).await?;
    Ok(Json(response))
}

/// GET /users/getReview?user_id=: PRs the user is assigned to review.
async fn get_review(
    State(state): State<AppState>,
    params: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserReviews>, ApiErr> {
    let params = query_params(params)?;
    let reviews = state.users.reviews(&params.user_id).await?;
    Ok(Json(reviews))
}
