use std::{future::Future, sync::Arc};

use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    cache::{FetchError, QueryCache, QueryKey},
    error::AnalyticsError,
    filters::{
        AnalyticsQuery, Direction, Endpoint, FilterState, LeaderboardMetric, Period, Visibility,
    },
    scope::{resolve_scope, Caller, Scope},
};

use super::{
    address_bar::AddressBar,
    source::AnalyticsSource,
    widget::{DashboardView, Widget},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

type WidgetSlot<T> = fn(&mut DashboardView) -> &mut Widget<T>;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// One open dashboard: the caller's filters, mirrored into the address bar,
/// and the six panels they drive.
pub struct DashboardController<S: AnalyticsSource> {
    caller: Caller,
    source: Arc<S>,
    cache: Arc<QueryCache>,
    address_bar: Arc<dyn AddressBar>,
    observer: Uuid,
    filters: Mutex<FilterState>,
    view: Mutex<DashboardView>,
}

impl<S: AnalyticsSource> DashboardController<S> {
    /// Reads the initial filters from the address bar, clamps them to what
    /// the caller may see and writes the normalized query back.
    pub fn new(
        caller: Caller,
        source: Arc<S>,
        cache: Arc<QueryCache>,
        address_bar: Arc<dyn AddressBar>,
    ) -> Self {
        let mut filters = FilterState::from_query(&address_bar.query(), today());
        clamp(&caller, &mut filters);
        address_bar.replace(&filters.to_query());

        Self {
            caller,
            source,
            cache,
            address_bar,
            observer: Uuid::new_v4(),
            filters: Mutex::new(filters),
            view: Mutex::new(DashboardView::default()),
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub async fn filters(&self) -> FilterState {
        self.filters.lock().await.clone()
    }

    pub async fn view(&self) -> DashboardView {
        self.view.lock().await.clone()
    }

    async fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut FilterState),
    {
        let mut filters = self.filters.lock().await;
        change(&mut filters);
        clamp(&self.caller, &mut filters);
        let query = filters.to_query();
        log_debug!("filters now {query:?}");
        self.address_bar.replace(&query);
    }

    pub async fn set_scope(&self, scope: Scope) {
        self.update(|filters| filters.set_scope(scope)).await;
    }

    pub async fn select_entity(&self, id: Option<String>) {
        self.update(|filters| filters.select_entity(id)).await;
    }

    pub async fn set_period(&self, period: Period) {
        self.update(|filters| filters.set_period(period, today())).await;
    }

    pub async fn set_range(&self, from: NaiveDate, to: NaiveDate) -> Result<(), AnalyticsError> {
        let mut result = Ok(());
        self.update(|filters| result = filters.set_range(from, to)).await;
        result
    }

    pub async fn set_direction(&self, direction: Direction) {
        self.update(|filters| filters.direction = direction).await;
    }

    pub async fn set_visibility(&self, visibility: Visibility) {
        self.update(|filters| filters.visibility = visibility).await;
    }

    pub async fn set_metric(&self, metric: LeaderboardMetric) {
        self.update(|filters| filters.metric = metric).await;
    }

    /// Loads every panel for the current filters. The loads run concurrently
    /// and each one only writes its own panel.
    pub async fn refresh(&self) -> DashboardView {
        let filters = self.filters().await;
        if !filters.is_complete() {
            log_info!("{} selection has no id yet, panels disabled", filters.scope);
        }

        tokio::join!(
            self.load(Endpoint::Overview, &filters, |v| &mut v.overview, |s, q| async move {
                s.overview(q).await
            }),
            self.load(Endpoint::Pulse, &filters, |v| &mut v.pulse, |s, q| async move {
                s.pulse(q).await
            }),
            self.load(Endpoint::Shoutouts, &filters, |v| &mut v.shoutouts, |s, q| async move {
                s.shoutouts(q).await
            }),
            self.load(Endpoint::Leaderboard, &filters, |v| &mut v.leaderboard, |s, q| async move {
                s.leaderboard(q).await
            }),
            self.load(
                Endpoint::CheckinCompliance,
                &filters,
                |v| &mut v.checkin_compliance,
                |s, q| async move { s.checkin_compliance(q).await },
            ),
            self.load(
                Endpoint::ReviewCompliance,
                &filters,
                |v| &mut v.review_compliance,
                |s, q| async move { s.review_compliance(q).await },
            ),
        );

        self.view().await
    }

    async fn load<T, F, Fut>(
        &self,
        endpoint: Endpoint,
        filters: &FilterState,
        slot: WidgetSlot<T>,
        fetch: F,
    ) where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Arc<S>, AnalyticsQuery) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let Some(query) = filters.query_for(endpoint) else {
            self.cache.release(self.observer, endpoint);
            slot(&mut *self.view.lock().await).disable();
            return;
        };
        let key = QueryKey::new(self.caller.user_id.clone(), endpoint, query.clone());

        let ticket = {
            let mut view = self.view.lock().await;
            let cached = self.cache.peek::<T>(&key);
            if self.cache.is_fresh(&key) {
                if let Some(data) = cached {
                    self.cache.release(self.observer, endpoint);
                    slot(&mut view).succeed(data);
                    return;
                }
            }
            // Claimed under the view lock so an older load can never write
            // after a newer one has started.
            let ticket = self.cache.begin(self.observer, key);
            slot(&mut view).start_loading(cached);
            ticket
        };

        let result = self
            .cache
            .run(&ticket, fetch(Arc::clone(&self.source), query))
            .await;

        let mut view = self.view.lock().await;
        if ticket.is_cancelled() {
            return;
        }
        match result {
            Ok(data) => slot(&mut view).succeed(data),
            Err(FetchError::Superseded) => {}
            Err(err @ FetchError::Failed(_)) => {
                log_error!("{} failed: {err}", endpoint.path());
                slot(&mut view).fail(endpoint, err);
            }
            Err(err) => {
                log_info!("{} failed: {err}", endpoint.path());
                slot(&mut view).fail(endpoint, err);
            }
        }
    }
}

/// Re-applies the permission rules after every change so the filters never
/// hold a selection the caller may not query.
fn clamp(caller: &Caller, filters: &mut FilterState) {
    let allowed = resolve_scope(caller, filters.scope, filters.id.as_deref());
    filters.apply_allowed(allowed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analytics::{
            Compliance, Leaderboard, LeaderboardEntry, Overview, PeriodTotals, PulsePoint,
            ShoutoutPoint,
        },
        cache::CacheConfig,
        commands::tests::seed,
        dashboard::{display::Trend, DisplayView, LocalSource, MemoryAddressBar, WidgetStatus},
        scope::Role,
    };
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    /// Scripted backend: ids starting with `slow` take 200ms and the
    /// leaderboard can be told to fail.
    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        fail_leaderboard: bool,
    }

    impl FakeSource {
        async fn pause(&self, query: &AnalyticsQuery) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.id.as_deref().is_some_and(|id| id.starts_with("slow")) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn compliance() -> Compliance {
        Compliance {
            on_time: 1,
            total: 2,
            percentage: Some(50.0),
        }
    }

    impl AnalyticsSource for FakeSource {
        async fn overview(&self, query: AnalyticsQuery) -> Result<Overview, FetchError> {
            self.pause(&query).await;
            let window = query.window(today()).map_err(FetchError::from)?;
            let current = PeriodTotals {
                pulse_average: 4.2,
                shoutouts: 80,
                ..Default::default()
            };
            let previous = PeriodTotals {
                pulse_average: 3.5,
                shoutouts: 100,
                ..Default::default()
            };
            Ok(Overview::compare(window, current, previous))
        }

        async fn pulse(&self, query: AnalyticsQuery) -> Result<Vec<PulsePoint>, FetchError> {
            self.pause(&query).await;
            Ok(Vec::new())
        }

        async fn shoutouts(&self, query: AnalyticsQuery) -> Result<Vec<ShoutoutPoint>, FetchError> {
            self.pause(&query).await;
            Ok(Vec::new())
        }

        async fn leaderboard(&self, query: AnalyticsQuery) -> Result<Leaderboard, FetchError> {
            self.pause(&query).await;
            if self.fail_leaderboard {
                return Err(FetchError::Failed("leaderboard backend down".into()));
            }
            Ok(Leaderboard {
                metric: query.metric.unwrap_or_default(),
                entries: vec![LeaderboardEntry {
                    entity_id: query.id.clone().unwrap_or_else(|| "org".into()),
                    entity_name: "Somebody".into(),
                    value: 3.0,
                }],
            })
        }

        async fn checkin_compliance(&self, query: AnalyticsQuery) -> Result<Compliance, FetchError> {
            self.pause(&query).await;
            Ok(compliance())
        }

        async fn review_compliance(&self, query: AnalyticsQuery) -> Result<Compliance, FetchError> {
            self.pause(&query).await;
            Ok(compliance())
        }
    }

    fn caller(role: Role) -> Caller {
        Caller {
            user_id: "u-self".into(),
            organization_id: "org-1".into(),
            role,
            team_id: Some("t-1".into()),
        }
    }

    fn dashboard(
        role: Role,
        url: &str,
        source: FakeSource,
        stale_time: Duration,
    ) -> (Arc<DashboardController<FakeSource>>, Arc<MemoryAddressBar>) {
        let bar = Arc::new(MemoryAddressBar::new(url));
        let cache = Arc::new(QueryCache::new(CacheConfig {
            stale_time,
            ..CacheConfig::default()
        }));
        let controller = DashboardController::new(caller(role), Arc::new(source), cache, bar.clone());
        (Arc::new(controller), bar)
    }

    #[tokio::test]
    async fn member_url_is_clamped_on_open() {
        let (controller, bar) = dashboard(Role::Member, "scope=team&id=t-9", FakeSource::default(), Duration::ZERO);
        let filters = controller.filters().await;
        assert_eq!(filters.scope, Scope::User);
        assert_eq!(filters.id.as_deref(), Some("u-self"));
        assert_eq!(bar.query(), "scope=user&id=u-self");
    }

    #[tokio::test]
    async fn filter_changes_replace_instead_of_push() {
        let (controller, bar) = dashboard(Role::Admin, "", FakeSource::default(), Duration::ZERO);
        controller.set_period(Period::Week).await;
        assert_eq!(bar.query(), "period=week");
        controller.set_metric(LeaderboardMetric::PulseAvg).await;
        assert_eq!(bar.query(), "period=week&metric=pulse_avg");
        assert_eq!(bar.history_len(), 1);
    }

    #[tokio::test]
    async fn manager_returning_to_team_scope_gets_own_team() {
        let (controller, bar) = dashboard(Role::Manager, "", FakeSource::default(), Duration::ZERO);
        assert_eq!(bar.query(), "scope=team&id=t-1");

        controller.set_scope(Scope::User).await;
        assert_eq!(controller.filters().await.id, None);
        assert_eq!(bar.query(), "scope=user");

        controller.select_entity(Some("u-7".into())).await;
        assert_eq!(bar.query(), "scope=user&id=u-7");

        controller.set_scope(Scope::Team).await;
        let filters = controller.filters().await;
        assert_eq!(filters.scope, Scope::Team);
        assert_eq!(filters.id.as_deref(), Some("t-1"));
        assert_eq!(bar.query(), "scope=team&id=t-1");
        assert_eq!(bar.history_len(), 1);
    }

    #[tokio::test]
    async fn incomplete_selection_disables_every_panel() {
        let (controller, _bar) = dashboard(Role::Admin, "", FakeSource::default(), Duration::ZERO);
        controller.set_scope(Scope::Team).await;
        let view = controller.refresh().await;
        assert_eq!(view.overview.status, WidgetStatus::Disabled);
        assert_eq!(view.review_compliance.status, WidgetStatus::Disabled);
        assert_eq!(controller.source.calls(), 0);
    }

    #[tokio::test]
    async fn one_failing_panel_leaves_the_rest_alone() {
        let source = FakeSource {
            fail_leaderboard: true,
            ..Default::default()
        };
        let (controller, _bar) = dashboard(Role::Admin, "", source, Duration::ZERO);
        let view = controller.refresh().await;
        assert_eq!(view.leaderboard.status, WidgetStatus::Failed);
        assert_eq!(view.leaderboard.error.as_deref(), Some("Failed to load leaderboard data"));
        assert!(view.leaderboard.cause.as_ref().is_some_and(FetchError::is_transient));
        for status in [
            view.overview.status,
            view.pulse.status,
            view.shoutouts.status,
            view.checkin_compliance.status,
            view.review_compliance.status,
        ] {
            assert_eq!(status, WidgetStatus::Ready);
        }
    }

    #[tokio::test]
    async fn rendered_view_marks_declines_and_formats_values() {
        let (controller, _bar) = dashboard(Role::Admin, "", FakeSource::default(), Duration::ZERO);
        let display = DisplayView::from(&controller.refresh().await);

        let overview = display.overview.expect("overview rendered");
        assert_eq!(overview.shoutouts.value, "80");
        assert_eq!(overview.shoutouts.change, "-20.0%");
        assert_eq!(overview.shoutouts.trend, Trend::Declining);
        assert_eq!(overview.pulse_average.value, "4.2");
        assert_eq!(overview.pulse_average.trend, Trend::Improving);
        assert_eq!(overview.active_users.trend, Trend::Flat);
        assert_eq!(display.leaderboard[0].rank, 1);
        assert_eq!(display.leaderboard[0].name, "Somebody");
        assert_eq!(display.leaderboard[0].value, "3");
        assert_eq!(display.checkin_compliance.as_deref(), Some("50%"));

        controller.set_metric(LeaderboardMetric::PulseAvg).await;
        let display = DisplayView::from(&controller.refresh().await);
        assert_eq!(display.leaderboard[0].value, "3.0");
    }

    #[tokio::test]
    async fn closed_dashboards_leave_no_slots_behind() {
        let cache = Arc::new(QueryCache::new(CacheConfig::default()));
        for _ in 0..50 {
            let controller = DashboardController::new(
                caller(Role::Admin),
                Arc::new(FakeSource::default()),
                Arc::clone(&cache),
                Arc::new(MemoryAddressBar::new("")),
            );
            controller.refresh().await;
        }
        assert_eq!(cache.in_flight(), 0);

        let controller = Arc::new(DashboardController::new(
            caller(Role::Admin),
            Arc::new(FakeSource::default()),
            Arc::clone(&cache),
            Arc::new(MemoryAddressBar::new("scope=team&id=slow-1")),
        ));
        let pending = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.in_flight(), Endpoint::ALL.len());

        pending.abort();
        let _ = pending.await;
        drop(controller);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_backend() {
        let (controller, _bar) = dashboard(Role::Admin, "", FakeSource::default(), Duration::from_secs(60));
        controller.refresh().await;
        assert_eq!(controller.source.calls(), 6);
        let view = controller.refresh().await;
        assert_eq!(controller.source.calls(), 6);
        assert_eq!(view.pulse.status, WidgetStatus::Ready);
    }

    #[tokio::test]
    async fn stale_data_stays_visible_while_refetching() {
        let (controller, _bar) = dashboard(Role::Admin, "scope=team&id=slow-1", FakeSource::default(), Duration::ZERO);
        controller.refresh().await;

        let background = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mid_flight = controller.view().await;
        assert_eq!(mid_flight.leaderboard.status, WidgetStatus::Loading);
        assert!(mid_flight.leaderboard.is_stale);
        assert!(mid_flight.leaderboard.data.is_some());

        let done = background.await.unwrap();
        assert_eq!(done.leaderboard.status, WidgetStatus::Ready);
        assert!(!done.leaderboard.is_stale);
    }

    #[tokio::test]
    async fn superseded_results_are_discarded() {
        let (controller, _bar) = dashboard(Role::Admin, "scope=team&id=slow-team", FakeSource::default(), Duration::ZERO);

        let slow = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        controller.select_entity(Some("fast-team".into())).await;
        controller.refresh().await;
        slow.await.unwrap();

        let view = controller.view().await;
        let board = view.leaderboard.data.expect("leaderboard loaded");
        assert_eq!(board.entries[0].entity_id, "fast-team");
        assert_eq!(view.leaderboard.status, WidgetStatus::Ready);
    }

    #[tokio::test]
    async fn local_source_serves_a_manager_dashboard() {
        let seeded = seed().await;
        let state = Arc::new(seeded.state);
        let manager = state.db.get_user(&seeded.manager).await.unwrap().unwrap().caller();
        let bar = Arc::new(MemoryAddressBar::new(
            "scope=organization&from=2024-03-01&to=2024-03-31&metric=pulse_avg",
        ));
        let controller = DashboardController::new(
            manager,
            Arc::new(LocalSource::new(Arc::clone(&state), seeded.manager.clone())),
            Arc::new(QueryCache::new(CacheConfig::default())),
            bar.clone(),
        );

        assert_eq!(
            bar.query(),
            format!(
                "scope=team&id={}&from=2024-03-01&to=2024-03-31&metric=pulse_avg",
                seeded.team_a
            )
        );

        let view = controller.refresh().await;
        let display = DisplayView::from(&view);
        let board = view.leaderboard.data.expect("leaderboard loaded");
        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.entries[0].entity_id, seeded.alice);
        assert_eq!(display.leaderboard[0].value, "4.0");
        assert_eq!(view.checkin_compliance.data.and_then(|c| c.percentage), Some(50.0));
        assert_eq!(display.checkin_compliance.as_deref(), Some("50%"));
        assert_eq!(view.overview.status, WidgetStatus::Ready);
    }
}
