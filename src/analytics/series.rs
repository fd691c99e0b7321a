use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{CheckinFact, ShoutoutFact},
    filters::Period,
};

/// First day of the bucket `date` falls in. Weeks start on Monday.
pub fn bucket_start(period: Period, date: NaiveDate) -> NaiveDate {
    let start = match period {
        Period::Day => Some(date),
        Period::Week => {
            date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        }
        Period::Month => date.with_day(1),
        Period::Quarter => NaiveDate::from_ymd_opt(date.year(), date.month0() / 3 * 3 + 1, 1),
        Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    };
    start.unwrap_or(date)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PulsePoint {
    pub period_start: NaiveDate,
    pub average: f64,
    pub responses: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShoutoutPoint {
    pub period_start: NaiveDate,
    pub count: u64,
}

/// Average mood per bucket, keyed by submission date. Buckets with no
/// responses are left out rather than reported as zero.
pub fn pulse_series(period: Period, checkins: &[CheckinFact]) -> Vec<PulsePoint> {
    let mut buckets: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for fact in checkins {
        let (Some(submitted_at), Some(rating)) = (fact.submitted_at, fact.mood_rating) else {
            continue;
        };
        let entry = buckets
            .entry(bucket_start(period, submitted_at.date_naive()))
            .or_default();
        entry.0 += u64::from(rating);
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(period_start, (sum, responses))| PulsePoint {
            period_start,
            average: sum as f64 / responses as f64,
            responses,
        })
        .collect()
}

pub fn shoutout_series(period: Period, shoutouts: &[ShoutoutFact]) -> Vec<ShoutoutPoint> {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for fact in shoutouts {
        *buckets
            .entry(bucket_start(period, fact.created_at.date_naive()))
            .or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|(period_start, count)| ShoutoutPoint {
            period_start,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn submitted(y: i32, m: u32, d: u32, rating: u8) -> CheckinFact {
        let at = Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap();
        CheckinFact {
            user_id: "u".into(),
            user_name: "U".into(),
            mood_rating: Some(rating),
            due_at: at,
            submitted_at: Some(at),
            review_due_at: None,
            reviewed_at: None,
        }
    }

    #[test]
    fn buckets_align_to_period_starts() {
        let wednesday = date(2024, 8, 14);
        assert_eq!(bucket_start(Period::Day, wednesday), wednesday);
        assert_eq!(bucket_start(Period::Week, wednesday), date(2024, 8, 12));
        assert_eq!(bucket_start(Period::Month, wednesday), date(2024, 8, 1));
        assert_eq!(bucket_start(Period::Quarter, wednesday), date(2024, 7, 1));
        assert_eq!(bucket_start(Period::Year, wednesday), date(2024, 1, 1));
        assert_eq!(bucket_start(Period::Week, date(2024, 8, 12)), date(2024, 8, 12));
    }

    #[test]
    fn pulse_points_are_ascending_averages() {
        let facts = vec![
            submitted(2024, 2, 20, 2),
            submitted(2024, 1, 3, 4),
            submitted(2024, 1, 30, 5),
        ];
        let points = pulse_series(Period::Month, &facts);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].period_start, date(2024, 1, 1));
        assert_eq!(points[0].average, 4.5);
        assert_eq!(points[0].responses, 2);
        assert_eq!(points[1].average, 2.0);
    }

    #[test]
    fn unsubmitted_checkins_are_skipped() {
        let mut pending = submitted(2024, 1, 3, 3);
        pending.submitted_at = None;
        assert!(pulse_series(Period::Week, &[pending]).is_empty());
    }

    #[test]
    fn shoutouts_count_per_bucket_without_gap_filling() {
        let at = |m, d| ShoutoutFact {
            from_user_id: "a".into(),
            from_name: "A".into(),
            to_user_id: "b".into(),
            to_name: "B".into(),
            is_public: true,
            created_at: Utc.with_ymd_and_hms(2024, m, d, 12, 0, 0).unwrap(),
        };
        let points = shoutout_series(Period::Quarter, &[at(1, 5), at(3, 30), at(11, 2)]);
        assert_eq!(
            points,
            vec![
                ShoutoutPoint {
                    period_start: date(2024, 1, 1),
                    count: 2
                },
                ShoutoutPoint {
                    period_start: date(2024, 10, 1),
                    count: 1
                },
            ]
        );
    }
}
