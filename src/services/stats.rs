//! Read-only assignment statistics.

use std::sync::Arc;

use crate::db::Store;
use crate::error::AppError;
use crate::models::Stats;

#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn Store>,
}

impl StatsService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Totals, plus per-user and per-PR breakdowns when `include_details`.
    ///
    /// A failing breakdown is logged and left out; only the totals query
    /// fails the call.
    pub async fn get(&self, include_details: bool) -> Result<Stats, AppError> {
        let mut gw = self.store.begin_read().await?;
        let mut stats = gw.total_stats().await?;

        if include_details {
            stats.user_assignments = match gw.user_assignment_stats().await {
                Ok(rows) => Some(rows),
                Err(e) => {
                    log::warn!("[stats] User assignment breakdown failed: {}", e);
                    None
                }
            };
            stats.pr_assignments = match gw.pr_assignment_stats().await {
                Ok(rows) => Some(rows),
                Err(e) => {
                    log::warn!("[stats] PR assignment breakdown failed: {}", e);
                    None
                }
            };
        }

        gw.commit().await?;
        Ok(stats)
    }
}
