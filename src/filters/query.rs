use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::AnalyticsError, scope::Scope};

use super::{
    period::{Direction, LeaderboardMetric, Period, Visibility},
    range::{format_date, DateWindow},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Overview,
    Pulse,
    Shoutouts,
    Leaderboard,
    CheckinCompliance,
    ReviewCompliance,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::Overview,
        Endpoint::Pulse,
        Endpoint::Shoutouts,
        Endpoint::Leaderboard,
        Endpoint::CheckinCompliance,
        Endpoint::ReviewCompliance,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Overview => "/api/analytics/overview",
            Endpoint::Pulse => "/api/analytics/pulse",
            Endpoint::Shoutouts => "/api/analytics/shoutouts",
            Endpoint::Leaderboard => "/api/analytics/leaderboard",
            Endpoint::CheckinCompliance => "/api/analytics/checkin-compliance",
            Endpoint::ReviewCompliance => "/api/analytics/review-compliance",
        }
    }

    /// Human name used in "Failed to load ... data".
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Overview => "overview",
            Endpoint::Pulse => "pulse",
            Endpoint::Shoutouts => "shoutouts",
            Endpoint::Leaderboard => "leaderboard",
            Endpoint::CheckinCompliance => "check-in compliance",
            Endpoint::ReviewCompliance => "review compliance",
        }
    }
}

/// Parameters accepted by the aggregation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<LeaderboardMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl AnalyticsQuery {
    /// Strict parse of a request query string; unknown keys are ignored,
    /// malformed values are rejected.
    pub fn parse(query: &str) -> Result<Self, AnalyticsError> {
        let mut parsed: Self = serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|err| AnalyticsError::invalid("query", err.to_string()))?;
        parsed.id = parsed.id.filter(|id| !id.is_empty());
        Ok(parsed)
    }

    /// Window the query covers; missing bounds come from the period lookback.
    pub fn window(&self, today: NaiveDate) -> Result<DateWindow, AnalyticsError> {
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) => (from, to),
            (Some(from), None) => (from, today),
            (None, Some(to)) => (self.period.lookback_start(to), to),
            (None, None) => return Ok(DateWindow::default_for(self.period, today)),
        };
        DateWindow::new(from, to).ok_or_else(|| {
            AnalyticsError::invalid("from", format!("{} is after {}", format_date(from), format_date(to)))
        })
    }
}
