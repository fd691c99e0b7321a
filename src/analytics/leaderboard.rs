use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    db::models::{CheckinFact, ShoutoutFact},
    filters::LeaderboardMetric,
};

pub const MAX_LEADERBOARD_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub entity_id: String,
    pub entity_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub metric: LeaderboardMetric,
    pub entries: Vec<LeaderboardEntry>,
}

/// Per-user accumulator that remembers first-seen order.
#[derive(Default)]
struct Tally<'a> {
    order: Vec<(&'a str, &'a str)>,
    totals: HashMap<&'a str, (u64, u64)>,
}

impl<'a> Tally<'a> {
    fn add(&mut self, id: &'a str, name: &'a str, amount: u64) {
        if !self.totals.contains_key(id) {
            self.order.push((id, name));
        }
        let entry = self.totals.entry(id).or_default();
        entry.0 += amount;
        entry.1 += 1;
    }

    fn into_entries(self, average: bool) -> Vec<LeaderboardEntry> {
        self.order
            .into_iter()
            .filter_map(|(id, name)| {
                let (sum, count) = *self.totals.get(id)?;
                let value = if average {
                    sum as f64 / count as f64
                } else {
                    sum as f64
                };
                Some(LeaderboardEntry {
                    entity_id: id.to_string(),
                    entity_name: name.to_string(),
                    value,
                })
            })
            .collect()
    }
}

/// Ranks users by `metric`, highest first. Ties keep the order in which the
/// users first appear in the facts (earliest activity first). Users with no
/// activity in the window are not listed.
pub fn rank(
    metric: LeaderboardMetric,
    checkins: &[CheckinFact],
    shoutouts: &[ShoutoutFact],
    limit: usize,
) -> Leaderboard {
    let mut tally = Tally::default();
    let average = match metric {
        LeaderboardMetric::ShoutoutsReceived => {
            for fact in shoutouts {
                tally.add(&fact.to_user_id, &fact.to_name, 1);
            }
            false
        }
        LeaderboardMetric::ShoutoutsGiven => {
            for fact in shoutouts {
                tally.add(&fact.from_user_id, &fact.from_name, 1);
            }
            false
        }
        LeaderboardMetric::PulseAvg => {
            for fact in checkins {
                if let Some(rating) = fact.mood_rating {
                    tally.add(&fact.user_id, &fact.user_name, u64::from(rating));
                }
            }
            true
        }
    };

    let mut entries = tally.into_entries(average);
    // `sort_by` is stable, which is what keeps the tie order.
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries.truncate(limit.clamp(1, MAX_LEADERBOARD_LIMIT));

    Leaderboard { metric, entries }
}
