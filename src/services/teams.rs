//! Team service.

use std::sync::Arc;

use crate::db::Store;
use crate::error::AppError;
use crate::models::Team;
use crate::services::pull_requests::validate_id;

#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn Store>,
}

impl TeamService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a team and upsert its members in one transaction.
    ///
    /// Members that already exist elsewhere are moved into the new team and
    /// their username and active flag overwritten.
    pub async fn create(&self, team: Team) -> Result<Team, AppError> {
        validate_id(&team.team_name, "team_name")?;
        for member in &team.members {
            validate_id(&member.user_id, "user_id")?;
        }

        let mut gw = self.store.begin().await?;

        if gw.team_exists(&team.team_name).await? {
            return Err(AppError::team_exists(&team.team_name));
        }

        gw.create_team(&team.team_name).await?;
        for member in &team.members {
            gw.upsert_user(member, &team.team_name).await?;
        }

        let members = gw.team_members(&team.team_name).await?;
        gw.commit().await?;

        log::info!(
            "[teams] Created {} with {} member(s)",
            team.team_name,
            members.len()
        );
        Ok(Team {
            team_name: team.team_name,
            members,
        })
    }

    pub async fn get(&self, team_name: &str) -> Result<Team, AppError> {
        validate_id(team_name, "team_name")?;

        let mut gw = self.store.begin_read().await?;
        if !gw.team_exists(team_name).await? {
            return Err(AppError::team_not_found(team_name));
        }
        let members = gw.team_members(team_name).await?;
        gw.commit().await?;

        Ok(Team {
            team_name: team_name.to_string(),
            members,
        })
    }
}
