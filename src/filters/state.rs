use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::AnalyticsError,
    scope::{AllowedScope, Scope},
};

use super::{
    period::{Direction, LeaderboardMetric, Period, Visibility},
    query::{AnalyticsQuery, Endpoint},
    range::{format_date, parse_date, DateWindow},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Query-string fields as written in the address bar, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilters {
    scope: Option<String>,
    id: Option<String>,
    period: Option<String>,
    from: Option<String>,
    to: Option<String>,
    direction: Option<String>,
    visibility: Option<String>,
    metric: Option<String>,
}

/// The non-default filters, in address-bar order.
#[derive(Debug, Default, Serialize)]
struct FilterQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metric: Option<LeaderboardMetric>,
}

fn lenient<T>(key: &str, value: Option<String>, parse: fn(&str) -> Option<T>) -> Option<T> {
    let value = value?;
    let parsed = parse(&value);
    if parsed.is_none() {
        log_warn!("ignoring invalid filter {key}={value}");
    }
    parsed
}

/// Dashboard filter selection, mirrored into the page query string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub scope: Scope,
    pub id: Option<String>,
    pub period: Period,
    pub window: DateWindow,
    /// Set once the user picks `from`/`to` by hand; cleared by `set_period`.
    pub range_overridden: bool,
    pub direction: Direction,
    pub visibility: Visibility,
    pub metric: LeaderboardMetric,
}

impl FilterState {
    pub fn defaults(today: NaiveDate) -> Self {
        let period = Period::default();
        Self {
            scope: Scope::default(),
            id: None,
            period,
            window: DateWindow::default_for(period, today),
            range_overridden: false,
            direction: Direction::default(),
            visibility: Visibility::default(),
            metric: LeaderboardMetric::default(),
        }
    }

    /// Lenient parse: absent or malformed fields keep their default.
    pub fn from_query(query: &str, today: NaiveDate) -> Self {
        let mut state = Self::defaults(today);
        let raw: RawFilters = serde_urlencoded::from_str(query.trim_start_matches('?'))
            .unwrap_or_else(|err| {
                log_warn!("ignoring unreadable query {query:?}: {err}");
                RawFilters::default()
            });

        if let Some(scope) = lenient("scope", raw.scope, Scope::parse) {
            state.scope = scope;
        }
        state.id = raw.id.filter(|id| !id.is_empty());
        if let Some(period) = lenient("period", raw.period, Period::parse) {
            state.period = period;
        }
        if let Some(direction) = lenient("direction", raw.direction, Direction::parse) {
            state.direction = direction;
        }
        if let Some(visibility) = lenient("visibility", raw.visibility, Visibility::parse) {
            state.visibility = visibility;
        }
        if let Some(metric) = lenient("metric", raw.metric, LeaderboardMetric::parse) {
            state.metric = metric;
        }
        let from = lenient("from", raw.from, parse_date);
        let to = lenient("to", raw.to, parse_date);

        state.window = DateWindow::default_for(state.period, today);
        if from.is_some() || to.is_some() {
            let explicit = AnalyticsQuery {
                period: state.period,
                from,
                to,
                ..Default::default()
            };
            match explicit.window(today) {
                Ok(window) => {
                    state.window = window;
                    state.range_overridden = true;
                }
                Err(err) => log_warn!("ignoring date range: {err}"),
            }
        }

        if state.scope == Scope::Organization {
            state.id = None;
        }
        state
    }

    /// Serialises only the fields that differ from their defaults.
    pub fn to_query(&self) -> String {
        let query = FilterQuery {
            scope: (self.scope != Scope::default()).then_some(self.scope),
            id: self.id.as_deref().filter(|_| self.scope.requires_id()),
            period: (self.period != Period::default()).then_some(self.period),
            from: self.range_overridden.then_some(self.window.from),
            to: self.range_overridden.then_some(self.window.to),
            direction: (self.direction != Direction::default()).then_some(self.direction),
            visibility: (self.visibility != Visibility::default()).then_some(self.visibility),
            metric: (self.metric != LeaderboardMetric::default()).then_some(self.metric),
        };
        serde_urlencoded::to_string(&query).unwrap_or_else(|err| {
            log_warn!("could not encode filters: {err}");
            String::new()
        })
    }

    /// Switching scope always drops the selected entity.
    pub fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
        self.id = None;
    }

    pub fn select_entity(&mut self, id: Option<String>) {
        self.id = id.filter(|id| !id.is_empty());
    }

    pub fn set_period(&mut self, period: Period, today: NaiveDate) {
        self.period = period;
        self.window = DateWindow::default_for(period, today);
        self.range_overridden = false;
    }

    pub fn set_range(&mut self, from: NaiveDate, to: NaiveDate) -> Result<(), AnalyticsError> {
        let window = DateWindow::new(from, to).ok_or_else(|| {
            AnalyticsError::invalid("from", format!("{} is after {}", format_date(from), format_date(to)))
        })?;
        self.window = window;
        self.range_overridden = true;
        Ok(())
    }

    pub fn apply_allowed(&mut self, allowed: AllowedScope) {
        self.scope = allowed.scope;
        self.id = allowed.id;
    }

    pub fn is_complete(&self) -> bool {
        !self.scope.requires_id() || self.id.is_some()
    }

    /// Request parameters for one widget, or `None` while the selection is
    /// incomplete (the widget stays disabled).
    pub fn query_for(&self, endpoint: Endpoint) -> Option<AnalyticsQuery> {
        if !self.is_complete() {
            return None;
        }
        let shoutouts = endpoint == Endpoint::Shoutouts;
        Some(AnalyticsQuery {
            scope: self.scope,
            id: if self.scope.requires_id() {
                self.id.clone()
            } else {
                None
            },
            period: self.period,
            from: Some(self.window.from),
            to: Some(self.window.to),
            direction: shoutouts.then_some(self.direction),
            visibility: shoutouts.then_some(self.visibility),
            metric: (endpoint == Endpoint::Leaderboard).then_some(self.metric),
            limit: None,
        })
    }
}
