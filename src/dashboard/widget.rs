use serde::Serialize;

use crate::{
    analytics::{Compliance, Leaderboard, Overview, PulsePoint, ShoutoutPoint},
    cache::FetchError,
    filters::Endpoint,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WidgetStatus {
    /// The filter selection is incomplete; nothing is requested.
    #[default]
    Disabled,
    Loading,
    Ready,
    Failed,
}

/// View state of one dashboard panel. Each panel is updated on its own, so a
/// failure in one never touches another.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Widget<T> {
    pub status: WidgetStatus,
    pub data: Option<T>,
    /// `data` belongs to an earlier selection or request.
    pub is_stale: bool,
    pub error: Option<String>,
    #[serde(skip)]
    pub cause: Option<FetchError>,
}

impl<T> Default for Widget<T> {
    fn default() -> Self {
        Self {
            status: WidgetStatus::Disabled,
            data: None,
            is_stale: false,
            error: None,
            cause: None,
        }
    }
}

impl<T> Widget<T> {
    pub fn disable(&mut self) {
        *self = Self::default();
    }

    /// Keeps showing `cached` (or whatever is on screen) while the request runs.
    pub fn start_loading(&mut self, cached: Option<T>) {
        if cached.is_some() {
            self.data = cached;
        }
        self.status = WidgetStatus::Loading;
        self.is_stale = self.data.is_some();
        self.error = None;
        self.cause = None;
    }

    pub fn succeed(&mut self, data: T) {
        self.status = WidgetStatus::Ready;
        self.data = Some(data);
        self.is_stale = false;
        self.error = None;
        self.cause = None;
    }

    pub fn fail(&mut self, endpoint: Endpoint, cause: FetchError) {
        self.status = WidgetStatus::Failed;
        self.is_stale = self.data.is_some();
        self.error = Some(format!("Failed to load {} data", endpoint.label()));
        self.cause = Some(cause);
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub overview: Widget<Overview>,
    pub pulse: Widget<Vec<PulsePoint>>,
    pub shoutouts: Widget<Vec<ShoutoutPoint>>,
    pub leaderboard: Widget<Leaderboard>,
    pub checkin_compliance: Widget<Compliance>,
    pub review_compliance: Widget<Compliance>,
}
