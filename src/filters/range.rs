use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::period::Period;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar-date range. As instants it covers
/// `[from 00:00Z, to + 1 day 00:00Z)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn default_for(period: Period, today: NaiveDate) -> Self {
        Self {
            from: period.lookback_start(today),
            to: today,
        }
    }

    pub fn days(&self) -> u64 {
        (self.to - self.from).num_days() as u64 + 1
    }

    /// Adjacent window of equal length ending the day before `from`.
    pub fn previous(&self) -> Self {
        let len = Days::new(self.days());
        let to = self.from.pred_opt().unwrap_or(NaiveDate::MIN);
        let from = self.from.checked_sub_days(len).unwrap_or(NaiveDate::MIN);
        Self { from, to }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.to
            .succ_opt()
            .unwrap_or(NaiveDate::MAX)
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant < self.end_exclusive()
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
