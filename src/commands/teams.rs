//! Team routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use super::{json_body, query_params, ApiErr};
use crate::models::Team;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
}

/// POST /team/add: create a team and upsert its members.
async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<Team>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiErr> {
    let team = json_body(payload)?;
    let team = state.teams.create(team).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// GET /team/get?team_name=: team with its members.
async fn get_team(
    State(state): State<AppState>,
    params: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiErr> {
    let params = query_params(params)?;
    let team = state.teams.get(&params.team_name).await?;
    Ok(Json(team))
}
