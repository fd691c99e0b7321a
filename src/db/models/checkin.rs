//! Weekly check-in records and the flattened rows analytics reads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: String,
    pub user_id: String,
    pub week_of: NaiveDate,
    /// Self-reported 1-5 rating; absent until submitted.
    pub mood_rating: Option<u8>,
    pub due_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub review_due_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Which timestamp places a check-in inside a query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinTimestamp {
    Submitted,
    Due,
    ReviewDue,
}

impl CheckinTimestamp {
    pub fn column(&self) -> &'static str {
        match self {
            CheckinTimestamp::Submitted => "c.submitted_at",
            CheckinTimestamp::Due => "c.due_at",
            CheckinTimestamp::ReviewDue => "c.review_due_at",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckinFact {
    pub user_id: String,
    pub user_name: String,
    pub mood_rating: Option<u8>,
    pub due_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub review_due_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
