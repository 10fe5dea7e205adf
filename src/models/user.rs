//! User model and deactivation outcomes.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::PullRequestShort;

/// A team member that can author and review pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of handling one PR during a deactivation cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReassignStatus {
    /// The deactivated reviewer was swapped for another team member.
    Replaced,
    /// No eligible replacement: the reviewer was only removed.
    RemovedNoReplacement,
}

impl std::fmt::Display for ReassignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replaced => write!(f, "REPLACED"),
            Self::RemovedNoReplacement => write!(f, "REMOVED_NO_REPLACEMENT"),
        }
    }
}

/// Per-PR outcome of a deactivation cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignOutcome {
    pub pr_id: String,
    pub old_reviewer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_reviewer_id: Option<String>,
    pub reassign_status: ReassignStatus,
}

impl ReassignOutcome {
    pub fn replaced(pr_id: &str, old_reviewer_id: &str, new_reviewer_id: String) -> Self {
        Self {
            pr_id: pr_id.to_string(),
            old_reviewer_id: old_reviewer_id.to_string(),
            new_reviewer_id: Some(new_reviewer_id),
            reassign_status: ReassignStatus::Replaced,
        }
    }

    pub fn removed(pr_id: &str, old_reviewer_id: &str) -> Self {
        Self {
            pr_id: pr_id.to_string(),
            old_reviewer_id: old_reviewer_id.to_string(),
            new_reviewer_id: None,
            reassign_status: ReassignStatus::RemovedNoReplacement,
        }
    }
}

/// Failure for a single user inside a bulk deactivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeactivateError {
    pub user_id: String,
    pub code: String,
    pub message: String,
}

/// Aggregate result of a bulk deactivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeactivateResponse {
    pub deactivated_user_ids: Vec<String>,
    #[serde(rename = "pull_requests_info")]
    pub pr_outcomes: Vec<ReassignOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BulkDeactivateError>,
}

/// Pull requests a user is assigned to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}
