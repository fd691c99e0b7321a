use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant boundary: every team, user and shoutout belongs to exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub organization_id: String,
    pub parent_team_id: Option<String>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
