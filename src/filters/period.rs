use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Time-bucketing granularity for series data. Also picks the default
/// lookback window when no explicit range is chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "day" => Some(Period::Day),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "quarter" => Some(Period::Quarter),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    /// Start of the default window ending at `today`:
    /// 30 days, 12 weeks, 12 months, 2 years or 5 years back.
    pub fn lookback_start(&self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            Period::Day => today.checked_sub_days(Days::new(30)),
            Period::Week => today.checked_sub_days(Days::new(12 * 7)),
            Period::Month => today.checked_sub_months(Months::new(12)),
            Period::Quarter => today.checked_sub_months(Months::new(24)),
            Period::Year => today.checked_sub_months(Months::new(60)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

/// Which side of a shoutout the scoped entity must be on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    All,
    Given,
    Received,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Direction::All),
            "given" => Some(Direction::Given),
            "received" => Some(Direction::Received),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    All,
    Public,
    Private,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Visibility::All),
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    /// `None` when both public and private shoutouts are included.
    pub fn is_public(&self) -> Option<bool> {
        match self {
            Visibility::All => None,
            Visibility::Public => Some(true),
            Visibility::Private => Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    #[default]
    ShoutoutsReceived,
    ShoutoutsGiven,
    PulseAvg,
}

impl LeaderboardMetric {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shoutouts_received" => Some(LeaderboardMetric::ShoutoutsReceived),
            "shoutouts_given" => Some(LeaderboardMetric::ShoutoutsGiven),
            "pulse_avg" => Some(LeaderboardMetric::PulseAvg),
            _ => None,
        }
    }
}
