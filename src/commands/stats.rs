//! Statistics route.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use super::{query_params, ApiErr};
use crate::models::Stats;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub details: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

/// GET /stats?details=true: totals, optionally with per-user/per-PR breakdowns.
async fn get_stats(
    State(state): State<AppState>,
    params: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<Stats>, ApiErr> {
    let params = query_params(params)?;
    let stats = state.stats.get(params.details).await?;
    Ok(Json(stats))
}
