use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    db::models::{CheckinFact, ShoutoutFact},
    filters::DateWindow,
};

/// Percentage delta of `current` against `previous`. A zero baseline yields
/// 0 when nothing changed and 100 otherwise.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetric {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
}

impl OverviewMetric {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            change: percent_change(current, previous),
        }
    }
}

/// Raw statistics for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    pub pulse_average: f64,
    pub responses: u64,
    pub shoutouts: u64,
    pub active_users: u64,
    pub completed_checkins: u64,
}

impl PeriodTotals {
    /// `checkins` are the submissions in the window and `shoutouts` the ones
    /// given by members of the scope. A user is active if they appear in
    /// either.
    pub fn from_facts(checkins: &[CheckinFact], shoutouts: &[ShoutoutFact]) -> Self {
        let mut active: HashSet<&str> = HashSet::new();
        let mut completed = 0u64;
        let mut rating_sum = 0u64;
        let mut responses = 0u64;

        for fact in checkins.iter().filter(|fact| fact.submitted_at.is_some()) {
            completed += 1;
            active.insert(&fact.user_id);
            if let Some(rating) = fact.mood_rating {
                rating_sum += u64::from(rating);
                responses += 1;
            }
        }
        for fact in shoutouts {
            active.insert(&fact.from_user_id);
        }

        Self {
            pulse_average: if responses == 0 {
                0.0
            } else {
                rating_sum as f64 / responses as f64
            },
            responses,
            shoutouts: shoutouts.len() as u64,
            active_users: active.len() as u64,
            completed_checkins: completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub pulse_average: OverviewMetric,
    pub shoutouts: OverviewMetric,
    pub active_users: OverviewMetric,
    pub completed_checkins: OverviewMetric,
    pub window: DateWindow,
    pub previous_window: DateWindow,
}

impl Overview {
    pub fn compare(window: DateWindow, current: PeriodTotals, previous: PeriodTotals) -> Self {
        Self {
            pulse_average: OverviewMetric::new(current.pulse_average, previous.pulse_average),
            shoutouts: OverviewMetric::new(current.shoutouts as f64, previous.shoutouts as f64),
            active_users: OverviewMetric::new(
                current.active_users as f64,
                previous.active_users as f64,
            ),
            completed_checkins: OverviewMetric::new(
                current.completed_checkins as f64,
                previous.completed_checkins as f64,
            ),
            window,
            previous_window: window.previous(),
        }
    }
}
