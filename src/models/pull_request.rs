//! Pull request model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// State of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl From<&str> for PullRequestStatus {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Merged => write!(f, "MERGED"),
        }
    }
}

/// Row shape of the `pull_requests` table.
///
/// Reviewers live in `pull_request_reviewers`; [`PullRequest`] joins both.
#[derive(Debug, Clone, FromRow)]
pub struct PullRequestRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    /// Status: `OPEN` or `MERGED`.
    pub status: String,
    pub created_at: i64,
    pub merged_at: Option<i64>,
}

impl PullRequestRow {
    /// Attach the assigned reviewer set.
    pub fn with_reviewers(self, assigned_reviewers: Vec<String>) -> PullRequest {
        PullRequest {
            status: PullRequestStatus::from(self.status.as_str()),
            pull_request_id: self.pull_request_id,
            pull_request_name: self.pull_request_name,
            author_id: self.author_id,
            assigned_reviewers,
            created_at: self.created_at,
            merged_at: self.merged_at,
        }
    }
}

/// A pull request together with its assigned reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Caller-supplied unique id.
    pub pull_request_id: String,

    pub pull_request_name: String,

    /// Author's user id. Never a member of `assigned_reviewers`.
    pub author_id: String,

    pub status: PullRequestStatus,

    /// Assigned reviewer ids, no duplicates, order not meaningful.
    pub assigned_reviewers: Vec<String>,

    /// Creation timestamp (Unix).
    #[serde(rename = "createdAt")]
    pub created_at: i64,

    /// Merge timestamp (Unix, if merged).
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<i64>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }

    /// Ids that may never be picked as a new reviewer: the author and
    /// everyone already assigned.
    pub fn excluded_reviewer_ids(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(self.assigned_reviewers.len() + 1);
        ids.push(self.author_id.clone());
        ids.extend(self.assigned_reviewers.iter().cloned());
        ids
    }
}

/// Compact PR listing used by reviewer queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl PullRequestShort {
    pub fn status_enum(&self) -> PullRequestStatus {
        PullRequestStatus::from(self.status.as_str())
    }
}

/// Input for creating a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}
