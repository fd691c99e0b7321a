use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::CheckinFact;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Compliance {
    pub on_time: u64,
    pub total: u64,
    /// `None` when nothing was due.
    pub percentage: Option<f64>,
}

impl Compliance {
    fn tally<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (on_time, total) = outcomes
            .into_iter()
            .fold((0u64, 0u64), |(on_time, total), ok| (on_time + u64::from(ok), total + 1));
        Self {
            on_time,
            total,
            percentage: (total > 0).then(|| on_time as f64 / total as f64 * 100.0),
        }
    }
}

/// Share of check-ins submitted by their deadline. Check-ins still open at
/// `as_of` are not counted yet.
pub fn checkin_compliance(facts: &[CheckinFact], as_of: DateTime<Utc>) -> Compliance {
    Compliance::tally(
        facts
            .iter()
            .filter(|fact| fact.submitted_at.is_some() || fact.due_at <= as_of)
            .map(|fact| fact.submitted_at.is_some_and(|at| at <= fact.due_at)),
    )
}

/// Share of submitted check-ins a manager reviewed within the review window.
pub fn review_compliance(facts: &[CheckinFact], as_of: DateTime<Utc>) -> Compliance {
    Compliance::tally(facts.iter().filter_map(|fact| {
        let due = fact.review_due_at?;
        if fact.reviewed_at.is_none() && due > as_of {
            return None;
        }
        Some(fact.reviewed_at.is_some_and(|at| at <= due))
    }))
}
