//! Application error types.
//!
//! Every failure the services can report is one variant of [`AppError`].
//! Variants serialize to a structured JSON object and carry a stable
//! outcome code so the HTTP layer can map them without string matching.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by the services.
///
/// Not-found and conflict variants are caller-correctable and surface as-is.
/// `Database`, `Config` and `Internal` are infrastructure failures and are
/// reported to clients only as a generic internal error.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Team does not exist.
    #[error("team {team_name} not found")]
    TeamNotFound { team_name: String },

    /// User does not exist.
    #[error("user {user_id} not found")]
    UserNotFound { user_id: String },

    /// Pull request does not exist.
    #[error("PR {pr_id} not found")]
    PullRequestNotFound { pr_id: String },

    /// A team with this name already exists.
    #[error("team_name {team_name} already exists")]
    TeamAlreadyExists { team_name: String },

    /// A pull request with this id already exists.
    #[error("PR id {pr_id} already exists")]
    PullRequestAlreadyExists { pr_id: String },

    /// Reviewers cannot be changed once the PR is merged.
    #[error("cannot reassign on merged PR {pr_id}")]
    PullRequestMerged { pr_id: String },

    /// The reviewer to replace is not assigned to the PR.
    #[error("reviewer {user_id} is not assigned to PR {pr_id}")]
    ReviewerNotAssigned { pr_id: String, user_id: String },

    /// No active user is eligible to take over the review.
    #[error("no active replacement candidate in team")]
    NoCandidate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pr_id: Option<String>,
    },

    /// Bulk deactivation was called without any user ids.
    #[error("user_ids cannot be empty")]
    EmptyUserIds,

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn team_not_found(team_name: impl Into<String>) -> Self {
        Self::TeamNotFound {
            team_name: team_name.into(),
        }
    }

    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn pr_not_found(pr_id: impl Into<String>) -> Self {
        Self::PullRequestNotFound {
            pr_id: pr_id.into(),
        }
    }

    pub fn team_exists(team_name: impl Into<String>) -> Self {
        Self::TeamAlreadyExists {
            team_name: team_name.into(),
        }
    }

    pub fn pr_exists(pr_id: impl Into<String>) -> Self {
        Self::PullRequestAlreadyExists {
            pr_id: pr_id.into(),
        }
    }

    pub fn pr_merged(pr_id: impl Into<String>) -> Self {
        Self::PullRequestMerged {
            pr_id: pr_id.into(),
        }
    }

    pub fn not_assigned(pr_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::ReviewerNotAssigned {
            pr_id: pr_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Create a no-candidate error, optionally tied to a PR.
    pub fn no_candidate(pr_id: Option<&str>) -> Self {
        Self::NoCandidate {
            pr_id: pr_id.map(str::to_string),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable outcome code exposed to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TeamNotFound { .. }
            | Self::UserNotFound { .. }
            | Self::PullRequestNotFound { .. } => "NOT_FOUND",
            Self::TeamAlreadyExists { .. } => "TEAM_EXISTS",
            Self::PullRequestAlreadyExists { .. } => "PR_EXISTS",
            Self::PullRequestMerged { .. } => "PR_MERGED",
            Self::ReviewerNotAssigned { .. } => "NOT_ASSIGNED",
            Self::NoCandidate { .. } => "NO_CANDIDATE",
            Self::EmptyUserIds | Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Database { .. } | Self::Config { .. } | Self::Internal { .. } => {
                "INTERNAL_ERROR"
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TeamNotFound { .. } | Self::UserNotFound { .. } | Self::PullRequestNotFound { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::TeamAlreadyExists { .. }
                | Self::PullRequestAlreadyExists { .. }
                | Self::PullRequestMerged { .. }
                | Self::ReviewerNotAssigned { .. }
                | Self::NoCandidate { .. }
        )
    }

    /// Infrastructure failures whose detail must not reach clients.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database { .. } | Self::Config { .. } | Self::Internal { .. }
        )
    }

    /// Message safe to show to a client.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}
