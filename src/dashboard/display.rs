//! Value formatting for the dashboard panels.

use serde::Serialize;

use crate::{
    analytics::{Compliance, Leaderboard, Overview, OverviewMetric},
    filters::LeaderboardMetric,
};

use super::widget::DashboardView;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Flat,
    Declining,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Improving
        } else if change < 0.0 {
            Trend::Declining
        } else {
            Trend::Flat
        }
    }
}

/// Signed percentage with one decimal, e.g. `+12.5%` or `-20.0%`.
pub fn format_change(change: f64) -> String {
    if change > 0.0 {
        format!("+{change:.1}%")
    } else {
        format!("{change:.1}%")
    }
}

/// Pulse averages keep one decimal; shoutout counts are whole numbers.
pub fn format_leaderboard_value(metric: LeaderboardMetric, value: f64) -> String {
    match metric {
        LeaderboardMetric::PulseAvg => format!("{value:.1}"),
        LeaderboardMetric::ShoutoutsReceived | LeaderboardMetric::ShoutoutsGiven => {
            format!("{}", value.round() as i64)
        }
    }
}

pub fn format_percentage(percentage: Option<f64>) -> String {
    match percentage {
        Some(value) => format!("{value:.0}%"),
        None => "n/a".to_string(),
    }
}

/// One overview card as rendered.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricDisplay {
    pub value: String,
    pub change: String,
    pub trend: Trend,
}

impl MetricDisplay {
    fn new(metric: &OverviewMetric, value: String) -> Self {
        Self {
            value,
            change: format_change(metric.change),
            trend: Trend::from_change(metric.change),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverviewDisplay {
    pub pulse_average: MetricDisplay,
    pub shoutouts: MetricDisplay,
    pub active_users: MetricDisplay,
    pub completed_checkins: MetricDisplay,
}

impl From<&Overview> for OverviewDisplay {
    fn from(overview: &Overview) -> Self {
        let count =
            |metric: &OverviewMetric| MetricDisplay::new(metric, format!("{:.0}", metric.current));
        Self {
            pulse_average: MetricDisplay::new(
                &overview.pulse_average,
                format!("{:.1}", overview.pulse_average.current),
            ),
            shoutouts: count(&overview.shoutouts),
            active_users: count(&overview.active_users),
            completed_checkins: count(&overview.completed_checkins),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: usize,
    pub name: String,
    pub value: String,
}

fn leaderboard_rows(board: &Leaderboard) -> Vec<LeaderboardRow> {
    board
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| LeaderboardRow {
            rank: index + 1,
            name: entry.entity_name.clone(),
            value: format_leaderboard_value(board.metric, entry.value),
        })
        .collect()
}

/// Formatted text for every panel that currently has data.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayView {
    pub overview: Option<OverviewDisplay>,
    pub leaderboard: Vec<LeaderboardRow>,
    pub checkin_compliance: Option<String>,
    pub review_compliance: Option<String>,
}

impl From<&DashboardView> for DisplayView {
    fn from(view: &DashboardView) -> Self {
        let compliance = |data: &Option<Compliance>| {
            data.as_ref().map(|compliance| format_percentage(compliance.percentage))
        };
        Self {
            overview: view.overview.data.as_ref().map(OverviewDisplay::from),
            leaderboard: view
                .leaderboard
                .data
                .as_ref()
                .map(leaderboard_rows)
                .unwrap_or_default(),
            checkin_compliance: compliance(&view.checkin_compliance.data),
            review_compliance: compliance(&view.review_compliance.data),
        }
    }
}
