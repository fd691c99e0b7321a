use std::{future::Future, sync::Arc};

use crate::{
    analytics::{Compliance, Leaderboard, Overview, PulsePoint, ShoutoutPoint},
    cache::FetchError,
    commands,
    filters::AnalyticsQuery,
    AppState,
};

/// Backend the dashboard reads from, one method per endpoint.
pub trait AnalyticsSource: Send + Sync + 'static {
    fn overview(
        &self,
        query: AnalyticsQuery,
    ) -> impl Future<Output = Result<Overview, FetchError>> + Send;

    fn pulse(
        &self,
        query: AnalyticsQuery,
    ) -> impl Future<Output = Result<Vec<PulsePoint>, FetchError>> + Send;

    fn shoutouts(
        &self,
        query: AnalyticsQuery,
    ) -> impl Future<Output = Result<Vec<ShoutoutPoint>, FetchError>> + Send;

    fn leaderboard(
        &self,
        query: AnalyticsQuery,
    ) -> impl Future<Output = Result<Leaderboard, FetchError>> + Send;

    fn checkin_compliance(
        &self,
        query: AnalyticsQuery,
    ) -> impl Future<Output = Result<Compliance, FetchError>> + Send;

    fn review_compliance(
        &self,
        query: AnalyticsQuery,
    ) -> impl Future<Output = Result<Compliance, FetchError>> + Send;
}

/// Calls the endpoint handlers in-process on behalf of one user.
#[derive(Clone)]
pub struct LocalSource {
    state: Arc<AppState>,
    caller_id: String,
}

impl LocalSource {
    pub fn new(state: Arc<AppState>, caller_id: impl Into<String>) -> Self {
        Self {
            state,
            caller_id: caller_id.into(),
        }
    }
}

impl AnalyticsSource for LocalSource {
    async fn overview(&self, query: AnalyticsQuery) -> Result<Overview, FetchError> {
        Ok(commands::get_overview(&self.state, &self.caller_id, &query).await?)
    }

    async fn pulse(&self, query: AnalyticsQuery) -> Result<Vec<PulsePoint>, FetchError> {
        Ok(commands::get_pulse(&self.state, &self.caller_id, &query).await?)
    }

    async fn shoutouts(&self, query: AnalyticsQuery) -> Result<Vec<ShoutoutPoint>, FetchError> {
        Ok(commands::get_shoutouts(&self.state, &self.caller_id, &query).await?)
    }

    async fn leaderboard(&self, query: AnalyticsQuery) -> Result<Leaderboard, FetchError> {
        Ok(commands::get_leaderboard(&self.state, &self.caller_id, &query).await?)
    }

    async fn checkin_compliance(&self, query: AnalyticsQuery) -> Result<Compliance, FetchError> {
        Ok(commands::get_checkin_compliance(&self.state, &self.caller_id, &query).await?)
    }

    async fn review_compliance(&self, query: AnalyticsQuery) -> Result<Compliance, FetchError> {
        Ok(commands::get_review_compliance(&self.state, &self.caller_id, &query).await?)
    }
}
