//! Persistence gateway abstraction.
//!
//! [`Store`] opens units of work; each returns a [`Gateway`] whose calls all
//! run on one database transaction. [`Gateway::commit`] makes the work
//! durable. Dropping a gateway without committing rolls everything back,
//! including when the owning future is cancelled.
//!
//! Services hold an `Arc<dyn Store>` and never cache rows across units of
//! work: everything they mutate is re-read inside the transaction first.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    NewPullRequest, PrAssignmentStats, PullRequest, PullRequestShort, Stats, TeamMember, User,
    UserAssignmentStats,
};

/// Source of transactional units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a read-write unit of work.
    ///
    /// Writers are serialized: a second `begin` waits for the first unit of
    /// work to finish (up to the store's busy timeout).
    async fn begin(&self) -> Result<Box<dyn Gateway>, AppError>;

    /// Open a read-only unit of work. Does not block writers.
    async fn begin_read(&self) -> Result<Box<dyn Gateway>, AppError>;
}

/// Row operations bound to a single transaction.
///
/// Lookups by id return `Ok(None)` when the row is absent; mapping absence to
/// a domain error is the caller's job.
#[async_trait]
pub trait Gateway: Send {
    // ── Teams ───────────────────────────────────────────────────────────────

    async fn team_exists(&mut self, team_name: &str) -> Result<bool, AppError>;

    async fn create_team(&mut self, team_name: &str) -> Result<(), AppError>;

    /// Members of a team ordered by user id.
    async fn team_members(&mut self, team_name: &str) -> Result<Vec<TeamMember>, AppError>;

    // ── Users ───────────────────────────────────────────────────────────────

    /// Insert the user or move an existing one into `team_name`, overwriting
    /// its username and active flag.
    async fn upsert_user(&mut self, member: &TeamMember, team_name: &str) -> Result<(), AppError>;

    async fn get_user(&mut self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn set_user_active(
        &mut self,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<User>, AppError>;

    /// Active users of `team_name` whose id is not in `exclude_ids`.
    async fn active_users_by_team(
        &mut self,
        team_name: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<User>, AppError>;

    // ── Pull requests ───────────────────────────────────────────────────────

    async fn pr_exists(&mut self, pr_id: &str) -> Result<bool, AppError>;

    /// Insert an OPEN pull request with no reviewers. Returns `created_at`.
    async fn create_pr(&mut self, pr: &NewPullRequest) -> Result<i64, AppError>;

    async fn get_pr(&mut self, pr_id: &str) -> Result<Option<PullRequest>, AppError>;

    /// Set status MERGED and stamp `merged_at`.
    async fn merge_pr(&mut self, pr_id: &str) -> Result<(), AppError>;

    /// Add a reviewer. Adding one that is already assigned is a no-op.
    async fn assign_reviewer(&mut self, reviewer_id: &str, pr_id: &str) -> Result<(), AppError>;

    /// Remove a reviewer. Removing one that is not assigned is a no-op.
    async fn remove_reviewer(&mut self, reviewer_id: &str, pr_id: &str) -> Result<(), AppError>;

    async fn is_reviewer_assigned(&mut self, pr_id: &str, user_id: &str)
        -> Result<bool, AppError>;

    /// OPEN pull requests the user is assigned to review.
    async fn open_prs_by_reviewer(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError>;

    /// Every pull request (any status) the user is assigned to review.
    async fn prs_by_reviewer(&mut self, user_id: &str)
        -> Result<Vec<PullRequestShort>, AppError>;

    // ── Statistics ──────────────────────────────────────────────────────────

    async fn total_stats(&mut self) -> Result<Stats, AppError>;

    async fn user_assignment_stats(&mut self) -> Result<Vec<UserAssignmentStats>, AppError>;

    async fn pr_assignment_stats(&mut self) -> Result<Vec<PrAssignmentStats>, AppError>;

    // ── Transaction control ─────────────────────────────────────────────────

    /// Commit the unit of work.
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
