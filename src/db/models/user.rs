use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::{Caller, Role};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team_id: Option<String>,
    pub manager_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            role: self.role,
            team_id: self.team_id.clone(),
        }
    }
}
