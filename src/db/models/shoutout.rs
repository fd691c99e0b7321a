use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Peer recognition from one user to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shoutout {
    pub id: String,
    pub organization_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub message: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoutoutFact {
    pub from_user_id: String,
    pub from_name: String,
    pub to_user_id: String,
    pub to_name: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}
