//! Read-side statistics models.

use serde::Serialize;
use sqlx::FromRow;

/// Totals across the whole store, with optional per-entity breakdowns.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct Stats {
    pub total_teams: i64,
    pub total_users: i64,
    #[serde(rename = "total_pull_requests")]
    pub total_prs: i64,
    #[serde(rename = "open_pull_requests")]
    pub open_prs: i64,
    #[serde(rename = "merged_pull_requests")]
    pub merged_prs: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_assignments: Option<Vec<UserAssignmentStats>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_assignments: Option<Vec<PrAssignmentStats>>,
}

/// How many PRs a user is assigned to review.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserAssignmentStats {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
    pub pr_count: i64,
}

/// How many reviewers a PR has.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrAssignmentStats {
    #[serde(rename = "pull_request_id")]
    pub pr_id: String,
    #[serde(rename = "pull_request_name")]
    pub pr_name: String,
    pub author_id: String,
    pub status: String,
    #[serde(rename = "reviewers_count")]
    pub reviewers: i64,
}
