//! Team model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Member entry as submitted on team creation and returned on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// A team and its members. Membership is derived from `users.team_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}
