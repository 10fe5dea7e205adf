//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pr_reviewers::db::{self, Gateway, SqliteStore, Store};
use pr_reviewers::models::{
    NewPullRequest, PrAssignmentStats, PullRequest, PullRequestShort, Stats, Team, TeamMember,
    User, UserAssignmentStats,
};
use pr_reviewers::AppError;
use tempfile::TempDir;

/// Temporary on-disk database. Dropping it removes the directory.
pub struct TestDb {
    pub store: Arc<SqliteStore>,
    _dir: TempDir,
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
    TestDb {
        store: Arc::new(SqliteStore::new(pool)),
        _dir: dir,
    }
}

pub fn member(user_id: &str, is_active: bool) -> TeamMember {
    TeamMember {
        user_id: user_id.to_string(),
        username: format!("{}-name", user_id),
        is_active,
    }
}

pub fn team(name: &str, members: &[(&str, bool)]) -> Team {
    Team {
        team_name: name.to_string(),
        members: members.iter().map(|(id, a)| member(id, *a)).collect(),
    }
}

pub fn new_pr(id: &str, author: &str) -> NewPullRequest {
    NewPullRequest {
        pull_request_id: id.to_string(),
        pull_request_name: format!("Change {}", id),
        author_id: author.to_string(),
    }
}

/// Current reviewers of a PR, read outside any service.
pub async fn reviewers_of(store: &dyn Store, pr_id: &str) -> Vec<String> {
    let mut gw = store.begin_read().await.unwrap();
    let mut ids = gw.get_pr(pr_id).await.unwrap().unwrap().assigned_reviewers;
    ids.sort();
    ids
}

pub async fn user(store: &dyn Store, user_id: &str) -> User {
    let mut gw = store.begin_read().await.unwrap();
    gw.get_user(user_id).await.unwrap().unwrap()
}

// ── Fault injection ──────────────────────────────────────────────────────────

/// Store wrapper whose gateways can be told to fail specific calls.
pub struct FaultyStore {
    inner: Arc<SqliteStore>,
    pub fail_candidate_lookup: Arc<AtomicBool>,
    pub fail_set_active: Arc<AtomicBool>,
    pub fail_user_stats: Arc<AtomicBool>,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            fail_candidate_lookup: Arc::new(AtomicBool::new(false)),
            fail_set_active: Arc::new(AtomicBool::new(false)),
            fail_user_stats: Arc::new(AtomicBool::new(false)),
        }
    }

    fn wrap(&self, inner: Box<dyn Gateway>) -> Box<dyn Gateway> {
        Box::new(FaultyGateway {
            inner,
            fail_candidate_lookup: self.fail_candidate_lookup.load(Ordering::SeqCst),
            fail_set_active: self.fail_set_active.load(Ordering::SeqCst),
            fail_user_stats: self.fail_user_stats.load(Ordering::SeqCst),
        })
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn begin(&self) -> Result<Box<dyn Gateway>, AppError> {
        Ok(self.wrap(self.inner.begin().await?))
    }

    async fn begin_read(&self) -> Result<Box<dyn Gateway>, AppError> {
        Ok(self.wrap(self.inner.begin_read().await?))
    }
}

struct FaultyGateway {
    inner: Box<dyn Gateway>,
    fail_candidate_lookup: bool,
    fail_set_active: bool,
    fail_user_stats: bool,
}

#[async_trait]
impl Gateway for FaultyGateway {
    async fn team_exists(&mut self, team_name: &str) -> Result<bool, AppError> {
        self.inner.team_exists(team_name).await
    }

    async fn create_team(&mut self, team_name: &str) -> Result<(), AppError> {
        self.inner.create_team(team_name).await
    }

    async fn team_members(&mut self, team_name: &str) -> Result<Vec<TeamMember>, AppError> {
        self.inner.team_members(team_name).await
    }

    async fn upsert_user(&mut self, member: &TeamMember, team_name: &str) -> Result<(), AppError> {
        self.inner.upsert_user(member, team_name).await
    }

    async fn get_user(&mut self, user_id: &str) -> Result<Option<User>, AppError> {
        self.inner.get_user(user_id).await
    }

    async fn set_user_active(
        &mut self,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<User>, AppError> {
        if self.fail_set_active {
            return Err(AppError::database_with_op("disk I/O error", "set active"));
        }
        self.inner.set_user_active(user_id, is_active).await
    }

    async fn active_users_by_team(
        &mut self,
        team_name: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<User>, AppError> {
        if self.fail_candidate_lookup {
            return Err(AppError::database_with_op("connection reset", "query active users"));
        }
        self.inner.active_users_by_team(team_name, exclude_ids).await
    }

    async fn pr_exists(&mut self, pr_id: &str) -> Result<bool, AppError> {
        self.inner.pr_exists(pr_id).await
    }

    async fn create_pr(&mut self, pr: &NewPullRequest) -> Result<i64, AppError> {
        self.inner.create_pr(pr).await
    }

    async fn get_pr(&mut self, pr_id: &str) -> Result<Option<PullRequest>, AppError> {
        self.inner.get_pr(pr_id).await
    }

    async fn merge_pr(&mut self, pr_id: &str) -> Result<(), AppError> {
        self.inner.merge_pr(pr_id).await
    }

    async fn assign_reviewer(&mut self, reviewer_id: &str, pr_id: &str) -> Result<(), AppError> {
        self.inner.assign_reviewer(reviewer_id, pr_id).await
    }

    async fn remove_reviewer(&mut self, reviewer_id: &str, pr_id: &str) -> Result<(), AppError> {
        self.inner.remove_reviewer(reviewer_id, pr_id).await
    }

    async fn is_reviewer_assigned(
        &mut self,
        pr_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        self.inner.is_reviewer_assigned(pr_id, user_id).await
    }

    async fn open_prs_by_reviewer(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        self.inner.open_prs_by_reviewer(user_id).await
    }

    async fn prs_by_reviewer(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        self.inner.prs_by_reviewer(user_id).await
    }

    async fn total_stats(&mut self) -> Result<Stats, AppError> {
        self.inner.total_stats().await
    }

    async fn user_assignment_stats(&mut self) -> Result<Vec<UserAssignmentStats>, AppError> {
        if self.fail_user_stats {
            return Err(AppError::database_with_op("database is locked", "user stats"));
        }
        self.inner.user_assignment_stats().await
    }

    async fn pr_assignment_stats(&mut self) -> Result<Vec<PrAssignmentStats>, AppError> {
        self.inner.pr_assignment_stats().await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.inner.commit().await
    }
}
