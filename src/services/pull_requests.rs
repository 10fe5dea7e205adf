//! Pull request assignment service.
//!
//! Creates pull requests with randomly chosen reviewers, merges them, and
//! swaps a single reviewer on request. Each operation is one unit of work:
//! any failure drops the gateway and rolls the whole operation back.

use std::sync::Arc;

use crate::db::{Gateway, Store};
use crate::error::AppError;
use crate::models::{NewPullRequest, PullRequest};
use crate::services::reviewer_picker::ReviewerPicker;

/// Number of reviewers assigned when a pull request is created.
pub const REVIEWERS_PER_PR: usize = 2;

#[derive(Clone)]
pub struct PullRequestService {
    store: Arc<dyn Store>,
    picker: Arc<dyn ReviewerPicker>,
}

impl PullRequestService {
    pub fn new(store: Arc<dyn Store>, picker: Arc<dyn ReviewerPicker>) -> Self {
        Self { store, picker }
    }

    /// Create an OPEN pull request and assign up to two reviewers from the
    /// author's team.
    ///
    /// Fewer than two active teammates is not an error: the PR gets however
    /// many are available, possibly none.
    pub async fn create(&self, input: NewPullRequest) -> Result<PullRequest, AppError> {
        validate_id(&input.pull_request_id, "pull_request_id")?;
        validate_id(&input.author_id, "author_id")?;

        let mut gw = self.store.begin().await?;

        let author = gw
            .get_user(&input.author_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(&input.author_id))?;
        log::debug!(
            "[pr] Creating {} for author {} (team {})",
            input.pull_request_id,
            author.user_id,
            author.team_name
        );

        if gw.pr_exists(&input.pull_request_id).await? {
            return Err(AppError::pr_exists(&input.pull_request_id));
        }

        let candidates = gw
            .active_users_by_team(&author.team_name, &[author.user_id.clone()])
            .await?;
        let candidate_count = candidates.len();
        let reviewers = self.picker.pick_many(candidates, REVIEWERS_PER_PR);

        gw.create_pr(&input).await?;
        for reviewer in &reviewers {
            gw.assign_reviewer(&reviewer.user_id, &input.pull_request_id)
                .await?;
        }

        let pr = reload(gw.as_mut(), &input.pull_request_id).await?;
        gw.commit().await?;

        log::info!(
            "[pr] Created {} with {} reviewer(s) from {} candidate(s): {:?}",
            pr.pull_request_id,
            pr.assigned_reviewers.len(),
            candidate_count,
            pr.assigned_reviewers
        );
        Ok(pr)
    }

    /// Mark a pull request as merged.
    ///
    /// Merging an already merged PR returns it unchanged and keeps the
    /// original merge timestamp.
    pub async fn merge(&self, pr_id: &str) -> Result<PullRequest, AppError> {
        validate_id(pr_id, "pull_request_id")?;

        let mut gw = self.store.begin().await?;

        let current = gw
            .get_pr(pr_id)
            .await?
            .ok_or_else(|| AppError::pr_not_found(pr_id))?;

        if current.is_merged() {
            log::debug!("[pr] {} already merged, nothing to do", pr_id);
            return Ok(current);
        }

        gw.merge_pr(pr_id).await?;
        let pr = reload(gw.as_mut(), pr_id).await?;
        gw.commit().await?;

        log::info!("[pr] Merged {}", pr_id);
        Ok(pr)
    }

    /// Replace `old_reviewer_id` on an open pull request with a random active
    /// member of the old reviewer's team.
    ///
    /// The author and every currently assigned reviewer (the outgoing one
    /// included) are excluded from the candidate pool.
    ///
    /// # Returns
    /// The updated pull request and the id of the new reviewer.
    pub async fn reassign(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String), AppError> {
        validate_id(pr_id, "pull_request_id")?;
        validate_id(old_reviewer_id, "old_user_id")?;

        let mut gw = self.store.begin().await?;

        let pr = gw
            .get_pr(pr_id)
            .await?
            .ok_or_else(|| AppError::pr_not_found(pr_id))?;

        if pr.is_merged() {
            log::warn!("[pr] Refusing to reassign on merged {}", pr_id);
            return Err(AppError::pr_merged(pr_id));
        }

        if !gw.is_reviewer_assigned(pr_id, old_reviewer_id).await? {
            return Err(AppError::not_assigned(pr_id, old_reviewer_id));
        }

        let old_reviewer = gw
            .get_user(old_reviewer_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(old_reviewer_id))?;

        let candidates = gw
            .active_users_by_team(&old_reviewer.team_name, &pr.excluded_reviewer_ids())
            .await?;
        if candidates.is_empty() {
            return Err(AppError::no_candidate(Some(pr_id)));
        }

        let new_reviewer = self
            .picker
            .pick_one(candidates)
            .map_err(|_| AppError::no_candidate(Some(pr_id)))?;

        // Remove then add: both are idempotent set operations.
        gw.remove_reviewer(old_reviewer_id, pr_id).await?;
        gw.assign_reviewer(&new_reviewer.user_id, pr_id).await?;

        let pr = reload(gw.as_mut(), pr_id).await?;
        gw.commit().await?;

        log::info!(
            "[pr] Reassigned {}: {} -> {}",
            pr_id,
            old_reviewer_id,
            new_reviewer.user_id
        );
        Ok((pr, new_reviewer.user_id))
    }
}

/// Re-read a pull request inside the current unit of work.
pub(crate) async fn reload(gw: &mut dyn Gateway, pr_id: &str) -> Result<PullRequest, AppError> {
    gw.get_pr(pr_id)
        .await?
        .ok_or_else(|| AppError::internal(format!("PR {} vanished inside its transaction", pr_id)))
}

pub(crate) fn validate_id(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            format!("{} is required", field),
            field,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::models::{PullRequestStatus, TeamMember};
    use crate::services::reviewer_picker::RandomPicker;
    use std::collections::HashSet;
    use tempfile::tempdir;

    async fn setup(members: &[(&str, bool)]) -> (PullRequestService, Arc<SqliteStore>) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        // Keep the dir alive by leaking it (for test purposes)
        std::mem::forget(dir);

        let pool = crate::db::initialize(&db_path).await.unwrap();
        let store = Arc::new(SqliteStore::new(pool));

        let mut gw = store.begin().await.unwrap();
        gw.create_team("core").await.unwrap();
        gw.create_team("infra").await.unwrap();
        for (id, active) in members {
            let member = TeamMember {
                user_id: id.to_string(),
                username: id.to_uppercase(),
                is_active: *active,
            };
            let team = if id.starts_with('i') { "infra" } else { "core" };
            gw.upsert_user(&member, team).await.unwrap();
        }
        gw.commit().await.unwrap();

        let service = PullRequestService::new(store.clone(), Arc::new(RandomPicker::seeded(11)));
        (service, store)
    }

    fn new_pr(id: &str, author: &str) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: id.to_string(),
            pull_request_name: format!("Change {}", id),
            author_id: author.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_two_distinct_reviewers() {
        let (service, _) = setup(&[("a", true), ("b", true), ("c", true), ("d", true)]).await;

        for n in 0..10 {
            let pr = service.create(new_pr(&format!("pr-{}", n), "a")).await.unwrap();
            assert_eq!(pr.status, PullRequestStatus::Open);
            assert_eq!(pr.assigned_reviewers.len(), 2);

            let unique: HashSet<_> = pr.assigned_reviewers.iter().collect();
            assert_eq!(unique.len(), 2);
            assert!(!pr.has_reviewer("a"), "author never reviews own PR");
        }
    }

    #[tokio::test]
    async fn test_create_with_one_candidate() {
        let (service, _) = setup(&[("a", true), ("b", true), ("c", false)]).await;

        let pr = service.create(new_pr("pr-1", "a")).await.unwrap();
        assert_eq!(pr.assigned_reviewers, vec!["b"]);
    }

    #[tokio::test]
    async fn test_create_without_candidates_is_not_an_error() {
        let (service, _) = setup(&[("a", true), ("b", false)]).await;

        let pr = service.create(new_pr("pr-1", "a")).await.unwrap();
        assert!(pr.assigned_reviewers.is_empty());
        assert!(pr.created_at > 0);
    }

    #[tokio::test]
    async fn test_create_only_draws_from_author_team() {
        let (service, _) = setup(&[("a", true), ("i1", true), ("i2", true)]).await;

        let pr = service.create(new_pr("pr-1", "a")).await.unwrap();
        assert!(pr.assigned_reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_and_unknown_author() {
        let (service, _) = setup(&[("a", true), ("b", true)]).await;

        service.create(new_pr("pr-1", "a")).await.unwrap();
        let err = service.create(new_pr("pr-1", "a")).await.unwrap_err();
        assert_eq!(err.code(), "PR_EXISTS");

        let err = service.create(new_pr("pr-2", "ghost")).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let (service, _) = setup(&[("a", true), ("b", true)]).await;
        service.create(new_pr("pr-1", "a")).await.unwrap();

        let merged = service.merge("pr-1").await.unwrap();
        assert!(merged.is_merged());
        let merged_at = merged.merged_at.unwrap();

        let again = service.merge("pr-1").await.unwrap();
        assert_eq!(again.merged_at, Some(merged_at));
        assert_eq!(again.assigned_reviewers, merged.assigned_reviewers);

        let err = service.merge("missing").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reassign_picks_outside_current_reviewers() {
        let (service, _) = setup(&[("a", true), ("b", true), ("c", true), ("d", true)]).await;
        let pr = service.create(new_pr("pr-1", "a")).await.unwrap();
        let old = pr.assigned_reviewers[0].clone();
        let kept = pr.assigned_reviewers[1].clone();

        let (updated, new_id) = service.reassign("pr-1", &old).await.unwrap();

        assert_ne!(new_id, old);
        assert_ne!(new_id, kept);
        assert_ne!(new_id, "a");
        assert!(!updated.has_reviewer(&old));
        assert!(updated.has_reviewer(&new_id));
        assert!(updated.has_reviewer(&kept));
        assert_eq!(updated.assigned_reviewers.len(), 2);
    }

    #[tokio::test]
    async fn test_reassign_errors() {
        let (service, store) = setup(&[("a", true), ("b", true), ("c", true)]).await;
        let pr = service.create(new_pr("pr-1", "a")).await.unwrap();
        assert_eq!(pr.assigned_reviewers.len(), 2);

        // Team exhausted: a is author, b and c both assigned
        let err = service.reassign("pr-1", "b").await.unwrap_err();
        assert_eq!(err.code(), "NO_CANDIDATE");

        let err = service.reassign("pr-1", "a").await.unwrap_err();
        assert_eq!(err.code(), "NOT_ASSIGNED");

        let err = service.reassign("nope", "b").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        service.merge("pr-1").await.unwrap();
        let err = service.reassign("pr-1", "b").await.unwrap_err();
        assert_eq!(err.code(), "PR_MERGED");

        let mut gw = store.begin_read().await.unwrap();
        let after = gw.get_pr("pr-1").await.unwrap().unwrap();
        assert_eq!(after.assigned_reviewers, pr.assigned_reviewers);
    }

    #[tokio::test]
    async fn test_reassign_uses_old_reviewer_team() {
        let (service, store) = setup(&[("a", true), ("i1", true), ("i2", true)]).await;
        service.create(new_pr("pr-1", "a")).await.unwrap();

        // Cross-team reviewer added by hand
        let mut gw = store.begin().await.unwrap();
        gw.assign_reviewer("i1", "pr-1").await.unwrap();
        gw.commit().await.unwrap();

        let (pr, new_id) = service.reassign("pr-1", "i1").await.unwrap();
        assert_eq!(new_id, "i2");
        assert_eq!(pr.assigned_reviewers, vec!["i2"]);
    }

    #[tokio::test]
    async fn test_blank_ids_rejected() {
        let (service, _) = setup(&[("a", true)]).await;
        let err = service.create(new_pr(" ", "a")).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
