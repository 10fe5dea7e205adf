//! SQLite implementation of the persistence gateway.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, Transaction};

use super::gateway::{Gateway, Store};
use super::pool::DbPool;
use crate::error::AppError;
use crate::models::{
    NewPullRequest, PrAssignmentStats, PullRequest, PullRequestRow, PullRequestShort, Stats,
    TeamMember, User, UserAssignmentStats,
};

const USER_COLUMNS: &str = "user_id, username, team_name, is_active, created_at, updated_at";

/// Get the current Unix timestamp.
fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Pool-backed [`Store`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn Gateway>, AppError> {
        // Take the write lock up front: a deferred read-then-write
        // transaction gets SQLITE_BUSY when another writer commits first.
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "begin transaction"))?;
        Ok(Box::new(SqliteGateway { tx }))
    }

    async fn begin_read(&self) -> Result<Box<dyn Gateway>, AppError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "begin read"))?;
        Ok(Box::new(SqliteGateway { tx }))
    }
}

/// Gateway bound to one SQLite transaction.
pub struct SqliteGateway {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteGateway {
    async fn reviewers_of(&mut self, pr_id: &str) -> Result<Vec<String>, AppError> {
        let reviewers: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM pull_request_reviewers
            WHERE pull_request_id = ?
            ORDER BY assigned_at, user_id
            "#,
        )
        .bind(pr_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(reviewers)
    }
}

#[async_trait]
impl Gateway for SqliteGateway {
    async fn team_exists(&mut self, team_name: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = ?)")
                .bind(team_name)
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(exists)
    }

    async fn create_team(&mut self, team_name: &str) -> Result<(), AppError> {
        let ts = now();
        sqlx::query("INSERT INTO teams (team_name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(team_name)
            .bind(ts)
            .bind(ts)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "insert team"))?;

        Ok(())
    }

    async fn team_members(&mut self, team_name: &str) -> Result<Vec<TeamMember>, AppError> {
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT user_id, username, is_active
            FROM users
            WHERE team_name = ?
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(members)
    }

    async fn upsert_user(&mut self, member: &TeamMember, team_name: &str) -> Result<(), AppError> {
        let ts = now();
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, team_name, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE
            SET username = excluded.username,
                team_name = excluded.team_name,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&member.user_id)
        .bind(&member.username)
        .bind(team_name)
        .bind(member.is_active)
        .bind(ts)
        .bind(ts)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            AppError::database_with_op(e.to_string(), format!("upsert user {}", member.user_id))
        })?;

        Ok(())
    }

    async fn get_user(&mut self, user_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE user_id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn set_user_active(
        &mut self,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = ?, updated_at = ? WHERE user_id = ? RETURNING {}",
            USER_COLUMNS
        ))
        .bind(is_active)
        .bind(now())
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn active_users_by_team(
        &mut self,
        team_name: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<User>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM users WHERE is_active = 1 AND team_name = ",
            USER_COLUMNS
        ));
        query.push_bind(team_name);

        if !exclude_ids.is_empty() {
            query.push(" AND user_id NOT IN (");
            let mut ids = query.separated(", ");
            for id in exclude_ids {
                ids.push_bind(id.as_str());
            }
            ids.push_unseparated(")");
        }
        query.push(" ORDER BY user_id");

        let users = query
            .build_query_as::<User>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "query active users"))?;

        Ok(users)
    }

    async fn pr_exists(&mut self, pr_id: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = ?)",
        )
        .bind(pr_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn create_pr(&mut self, pr: &NewPullRequest) -> Result<i64, AppError> {
        let created_at: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at)
            VALUES (?, ?, ?, 'OPEN', ?)
            RETURNING created_at
            "#,
        )
        .bind(&pr.pull_request_id)
        .bind(&pr.pull_request_name)
        .bind(&pr.author_id)
        .bind(now())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "insert pull request"))?;

        Ok(created_at)
    }

    async fn get_pr(&mut self, pr_id: &str) -> Result<Option<PullRequest>, AppError> {
        let row = sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
            FROM pull_requests
            WHERE pull_request_id = ?
            "#,
        )
        .bind(pr_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let reviewers = self.reviewers_of(pr_id).await?;
        Ok(Some(row.with_reviewers(reviewers)))
    }

    async fn merge_pr(&mut self, pr_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE pull_requests SET status = 'MERGED', merged_at = ? WHERE pull_request_id = ?",
        )
        .bind(now())
        .bind(pr_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "merge pull request"))?;

        Ok(())
    }

    async fn assign_reviewer(&mut self, reviewer_id: &str, pr_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO pull_request_reviewers (pull_request_id, user_id, assigned_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(pr_id)
        .bind(reviewer_id)
        .bind(now())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            AppError::database_with_op(e.to_string(), format!("assign reviewer {}", reviewer_id))
        })?;

        Ok(())
    }

    async fn remove_reviewer(&mut self, reviewer_id: &str, pr_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM pull_request_reviewers WHERE pull_request_id = ? AND user_id = ?")
            .bind(pr_id)
            .bind(reviewer_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "remove reviewer"))?;

        Ok(())
    }

    async fn is_reviewer_assigned(
        &mut self,
        pr_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM pull_request_reviewers
                WHERE pull_request_id = ? AND user_id = ?
            )
            "#,
        )
        .bind(pr_id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn open_prs_by_reviewer(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        let prs = sqlx::query_as::<_, PullRequestShort>(
            r#"
            SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status
            FROM pull_requests p
            JOIN pull_request_reviewers r ON r.pull_request_id = p.pull_request_id
            WHERE r.user_id = ? AND p.status = 'OPEN'
            ORDER BY p.created_at, p.pull_request_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(prs)
    }

    async fn prs_by_reviewer(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        let prs = sqlx::query_as::<_, PullRequestShort>(
            r#"
            SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status
            FROM pull_requests p
            JOIN pull_request_reviewers r ON r.pull_request_id = p.pull_request_id
            WHERE r.user_id = ?
            ORDER BY p.created_at, p.pull_request_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(prs)
    }

    async fn total_stats(&mut self) -> Result<Stats, AppError> {
        let stats = sqlx::query_as::<_, Stats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM teams) AS total_teams,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM pull_requests) AS total_prs,
                (SELECT COUNT(*) FROM pull_requests WHERE status = 'OPEN') AS open_prs,
                (SELECT COUNT(*) FROM pull_requests WHERE status = 'MERGED') AS merged_prs,
                (SELECT COUNT(*) FROM users WHERE is_active = 1) AS active_users,
                (SELECT COUNT(*) FROM users WHERE is_active = 0) AS inactive_users
            "#,
        )
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(stats)
    }

    async fn user_assignment_stats(&mut self) -> Result<Vec<UserAssignmentStats>, AppError> {
        let stats = sqlx::query_as::<_, UserAssignmentStats>(
            r#"
            SELECT
                u.user_id,
                u.username,
                u.team_name,
                u.is_active,
                COUNT(r.pull_request_id) AS pr_count
            FROM users u
            LEFT JOIN pull_request_reviewers r ON r.user_id = u.user_id
            GROUP BY u.user_id, u.username, u.team_name, u.is_active
            ORDER BY pr_count DESC, u.user_id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(stats)
    }

    async fn pr_assignment_stats(&mut self) -> Result<Vec<PrAssignmentStats>, AppError> {
        let stats = sqlx::query_as::<_, PrAssignmentStats>(
            r#"
            SELECT
                p.pull_request_id AS pr_id,
                p.pull_request_name AS pr_name,
                p.author_id,
                p.status,
                COUNT(r.user_id) AS reviewers
            FROM pull_requests p
            LEFT JOIN pull_request_reviewers r ON r.pull_request_id = p.pull_request_id
            GROUP BY p.pull_request_id, p.pull_request_name, p.author_id, p.status
            ORDER BY p.created_at DESC, p.pull_request_id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(stats)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "commit"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_store() -> SqliteStore {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        // Keep the dir alive by leaking it (for test purposes)
        std::mem::forget(dir);

        let pool = crate::db::initialize(&db_path).await.unwrap();
        let store = SqliteStore::new(pool);

        let mut gw = store.begin().await.unwrap();
        gw.create_team("backend").await.unwrap();
        for (id, name, active) in [("u1", "Alice", true), ("u2", "Bob", true), ("u3", "Carol", false)]
        {
            let member = TeamMember {
                user_id: id.into(),
                username: name.into(),
                is_active: active,
            };
            gw.upsert_user(&member, "backend").await.unwrap();
        }
        gw.commit().await.unwrap();

        store
    }

    fn new_pr(id: &str, author: &str) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: id.into(),
            pull_request_name: format!("PR {}", id),
            author_id: author.into(),
        }
    }

    #[tokio::test]
    async fn test_active_users_by_team_applies_exclusions() {
        let store = setup_store().await;
        let mut gw = store.begin_read().await.unwrap();

        let all = gw.active_users_by_team("backend", &[]).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);

        let rest = gw
            .active_users_by_team("backend", &["u1".to_string()])
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].user_id, "u2");

        let none = gw
            .active_users_by_team("frontend", &[])
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_reviewer_set_operations_are_idempotent() {
        let store = setup_store().await;
        let mut gw = store.begin().await.unwrap();

        gw.create_pr(&new_pr("pr-1", "u1")).await.unwrap();
        gw.assign_reviewer("u2", "pr-1").await.unwrap();
        gw.assign_reviewer("u2", "pr-1").await.unwrap();

        let pr = gw.get_pr("pr-1").await.unwrap().unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["u2"]);
        assert!(gw.is_reviewer_assigned("pr-1", "u2").await.unwrap());

        gw.remove_reviewer("u2", "pr-1").await.unwrap();
        gw.remove_reviewer("u2", "pr-1").await.unwrap();

        let pr = gw.get_pr("pr-1").await.unwrap().unwrap();
        assert!(pr.assigned_reviewers.is_empty());
        assert!(!gw.is_reviewer_assigned("pr-1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_prs_by_reviewer_skips_merged() {
        let store = setup_store().await;
        let mut gw = store.begin().await.unwrap();

        gw.create_pr(&new_pr("pr-1", "u1")).await.unwrap();
        gw.create_pr(&new_pr("pr-2", "u1")).await.unwrap();
        gw.assign_reviewer("u2", "pr-1").await.unwrap();
        gw.assign_reviewer("u2", "pr-2").await.unwrap();
        gw.merge_pr("pr-2").await.unwrap();

        let open = gw.open_prs_by_reviewer("u2").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].pull_request_id, "pr-1");

        let all = gw.prs_by_reviewer("u2").await.unwrap();
        assert_eq!(all.len(), 2);

        let merged = gw.get_pr("pr-2").await.unwrap().unwrap();
        assert!(merged.is_merged());
        assert!(merged.merged_at.is_some());
    }

    #[tokio::test]
    async fn test_dropped_gateway_rolls_back() {
        let store = setup_store().await;

        {
            let mut gw = store.begin().await.unwrap();
            gw.create_pr(&new_pr("pr-9", "u1")).await.unwrap();
            // dropped without commit
        }

        let mut gw = store.begin_read().await.unwrap();
        assert!(!gw.pr_exists("pr-9").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_user_active_missing_user() {
        let store = setup_store().await;
        let mut gw = store.begin().await.unwrap();

        assert!(gw.set_user_active("ghost", true).await.unwrap().is_none());

        let user = gw.set_user_active("u3", true).await.unwrap().unwrap();
        assert!(user.is_active);
        assert_eq!(user.team_name, "backend");
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let store = setup_store().await;
        let mut gw = store.begin().await.unwrap();
        gw.create_pr(&new_pr("pr-1", "u1")).await.unwrap();
        gw.assign_reviewer("u2", "pr-1").await.unwrap();
        gw.commit().await.unwrap();

        let mut gw = store.begin_read().await.unwrap();
        let totals = gw.total_stats().await.unwrap();
        assert_eq!(totals.total_teams, 1);
        assert_eq!(totals.total_users, 3);
        assert_eq!(totals.open_prs, 1);
        assert_eq!(totals.active_users, 2);
        assert_eq!(totals.inactive_users, 1);

        let users = gw.user_assignment_stats().await.unwrap();
        assert_eq!(users[0].user_id, "u2");
        assert_eq!(users[0].pr_count, 1);

        let prs = gw.pr_assignment_stats().await.unwrap();
        assert_eq!(prs[0].reviewers, 1);
    }
}
