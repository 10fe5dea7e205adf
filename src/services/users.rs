//! User lifecycle service.
//!
//! Activation is a plain flag update. Deactivation cascades: every open PR
//! the user reviews gets the user replaced by a teammate, or just removed
//! when nobody is available. The cascade and the flag flip commit together.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::join_all;
use tokio::task::{JoinError, JoinHandle};

use crate::db::{Gateway, Store};
use crate::error::AppError;
use crate::models::{
    BulkDeactivateError, BulkDeactivateResponse, ReassignOutcome, User, UserReviews,
};
use crate::services::pull_requests::{reload, validate_id};
use crate::services::reviewer_picker::ReviewerPicker;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    picker: Arc<dyn ReviewerPicker>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, picker: Arc<dyn ReviewerPicker>) -> Self {
        Self { store, picker }
    }

    /// Set a user's active flag.
    ///
    /// Only deactivation cascades into reviewer replacement; activating a
    /// user never touches pull requests.
    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        if !is_active {
            let (user, _) = self.deactivate(user_id).await?;
            return Ok(user);
        }

        validate_id(user_id, "user_id")?;

        let mut gw = self.store.begin().await?;
        let user = gw
            .set_user_active(user_id, true)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        gw.commit().await?;

        log::info!("[users] Activated {}", user_id);
        Ok(user)
    }

    /// Deactivate a user and re-staff every open PR they review.
    ///
    /// Deactivating an inactive user is a no-op returning the current record
    /// and no outcomes.
    pub async fn deactivate(
        &self,
        user_id: &str,
    ) -> Result<(User, Vec<ReassignOutcome>), AppError> {
        validate_id(user_id, "user_id")?;

        let mut gw = self.store.begin().await?;

        let user = gw
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))?;

        if !user.is_active {
            log::debug!("[users] {} already inactive", user_id);
            return Ok((user, Vec::new()));
        }

        let open_prs = gw.open_prs_by_reviewer(user_id).await?;
        let mut outcomes = Vec::with_capacity(open_prs.len());

        for short in &open_prs {
            let outcome = self
                .replace_reviewer(gw.as_mut(), &short.pull_request_id, &user)
                .await?;
            outcomes.push(outcome);
        }

        let user = gw
            .set_user_active(user_id, false)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))?;
        gw.commit().await?;

        log::info!(
            "[users] Deactivated {} ({} open PR(s) processed)",
            user_id,
            outcomes.len()
        );
        Ok((user, outcomes))
    }

    /// Deactivate many users concurrently, one task and one transaction per
    /// user. A failure for one user never affects the others.
    ///
    /// Duplicate ids are collapsed. Results are reported in input order.
    /// Dropping the returned future aborts every worker still running, so
    /// their uncommitted cascades roll back.
    pub async fn bulk_deactivate(
        &self,
        user_ids: Vec<String>,
    ) -> Result<BulkDeactivateResponse, AppError> {
        if user_ids.is_empty() {
            return Err(AppError::EmptyUserIds);
        }

        let mut seen = HashSet::new();
        let ids: Vec<String> = user_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        log::debug!("[users] Bulk deactivating {} user(s)", ids.len());

        let tasks = ids.iter().cloned().map(|id| {
            let service = self.clone();
            AbortOnDrop(tokio::spawn(async move { service.deactivate(&id).await }))
        });
        let results = join_all(tasks).await;

        let mut response = BulkDeactivateResponse::default();
        for (user_id, joined) in ids.into_iter().zip(results) {
            let result = joined.unwrap_or_else(|e| {
                Err(AppError::internal(format!("deactivation task failed: {}", e)))
            });

            match result {
                Ok((user, outcomes)) => {
                    response.deactivated_user_ids.push(user.user_id);
                    response.pr_outcomes.extend(outcomes);
                }
                Err(err) => {
                    log::warn!("[users] Bulk deactivation failed for {}: {}", user_id, err);
                    response.errors.push(BulkDeactivateError {
                        user_id,
                        code: err.code().to_string(),
                        message: err.public_message(),
                    });
                }
            }
        }

        log::info!(
            "[users] Bulk deactivation done: {} deactivated, {} PR(s) affected, {} error(s)",
            response.deactivated_user_ids.len(),
            response.pr_outcomes.len(),
            response.errors.len()
        );
        Ok(response)
    }

    /// Every PR (open or merged) the user is assigned to review.
    pub async fn reviews(&self, user_id: &str) -> Result<UserReviews, AppError> {
        validate_id(user_id, "user_id")?;

        let mut gw = self.store.begin_read().await?;
        if gw.get_user(user_id).await?.is_none() {
            return Err(AppError::user_not_found(user_id));
        }
        let pull_requests = gw.prs_by_reviewer(user_id).await?;
        gw.commit().await?;

        Ok(UserReviews {
            user_id: user_id.to_string(),
            pull_requests,
        })
    }

    /// Handle one PR of a deactivation cascade.
    ///
    /// Candidates come from the leaving user's team. A failed candidate
    /// lookup or an empty pool degrades to removal without replacement.
    async fn replace_reviewer(
        &self,
        gw: &mut dyn Gateway,
        pr_id: &str,
        leaving: &User,
    ) -> Result<ReassignOutcome, AppError> {
        let pr = reload(gw, pr_id).await?;

        let candidates = match gw
            .active_users_by_team(&leaving.team_name, &pr.excluded_reviewer_ids())
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!(
                    "[users] Candidate lookup failed for {}, removing {} without replacement: {}",
                    pr_id,
                    leaving.user_id,
                    e
                );
                Vec::new()
            }
        };

        let picked = if candidates.is_empty() {
            None
        } else {
            match self.picker.pick_one(candidates) {
                Ok(user) => Some(user),
                Err(e) => {
                    log::warn!("[users] Could not pick a replacement for {}: {}", pr_id, e);
                    None
                }
            }
        };

        gw.remove_reviewer(&leaving.user_id, pr_id).await?;

        let Some(replacement) = picked else {
            log::info!(
                "[users] Removed {} from {} with no replacement",
                leaving.user_id,
                pr_id
            );
            return Ok(ReassignOutcome::removed(pr_id, &leaving.user_id));
        };

        gw.assign_reviewer(&replacement.user_id, pr_id).await?;
        log::info!(
            "[users] Replaced {} with {} on {}",
            leaving.user_id,
            replacement.user_id,
            pr_id
        );
        Ok(ReassignOutcome::replaced(
            pr_id,
            &leaving.user_id,
            replacement.user_id,
        ))
    }
}

/// Spawned worker that is aborted when its handle is dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
