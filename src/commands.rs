//! Analytics endpoints. Each handler re-checks who is asking before it reads
//! anything: the caller must be an active user, the scope is clamped by
//! `authorize`, and the target must live in the caller's organization.

use chrono::{NaiveDate, Utc};

use crate::{
    analytics::{
        checkin_compliance, pulse_series, rank, review_compliance, shoutout_series, Compliance,
        Leaderboard, Overview, PeriodTotals, PulsePoint, ShoutoutPoint,
    },
    db::models::CheckinTimestamp,
    error::AnalyticsError,
    filters::{AnalyticsQuery, DateWindow, Direction, Endpoint, LeaderboardMetric, Visibility},
    scope::{authorize, Role, ScopeTarget},
    AppState,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

struct RequestContext {
    target: ScopeTarget,
    window: DateWindow,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn authorize_request(
    state: &AppState,
    caller_id: &str,
    endpoint: Endpoint,
    query: &AnalyticsQuery,
) -> Result<RequestContext, AnalyticsError> {
    let caller = match state.db.get_user(caller_id).await? {
        Some(user) if user.is_active => user.caller(),
        _ => {
            log_warn!("{} rejected: unknown caller {caller_id}", endpoint.path());
            return Err(AnalyticsError::UnknownCaller(caller_id.to_string()));
        }
    };

    let target = authorize(&caller, query.scope, query.id.as_deref())?;
    match &target {
        ScopeTarget::Organization(_) => {}
        ScopeTarget::Team(team_id) => {
            let team = state.db.get_team(team_id).await?;
            if team.map(|team| team.organization_id) != Some(caller.organization_id.clone()) {
                return Err(AnalyticsError::NotFound {
                    kind: "team",
                    id: team_id.clone(),
                });
            }
        }
        ScopeTarget::User(user_id) => {
            let user = state
                .db
                .get_user(user_id)
                .await?
                .filter(|user| user.organization_id == caller.organization_id)
                .ok_or_else(|| AnalyticsError::NotFound {
                    kind: "user",
                    id: user_id.clone(),
                })?;
            let same_team = user.team_id.is_some() && user.team_id == caller.team_id;
            if caller.role == Role::Manager && user.id != caller.user_id && !same_team {
                log_warn!(
                    "{} rejected: manager {} asked for user {} outside their team",
                    endpoint.path(),
                    caller.user_id,
                    user.id
                );
                return Err(AnalyticsError::Forbidden {
                    role: caller.role,
                    scope: target.scope(),
                    id: user_id.clone(),
                });
            }
        }
    }

    let window = query.window(today())?;
    log_info!(
        "{} for {} as {}:{} over {}..{}",
        endpoint.path(),
        caller.user_id,
        target.scope(),
        target.id(),
        window.from,
        window.to
    );

    Ok(RequestContext {
        target,
        window,
    })
}

async fn period_totals(
    state: &AppState,
    target: &ScopeTarget,
    window: DateWindow,
) -> Result<PeriodTotals, AnalyticsError> {
    let (checkins, shoutouts) = tokio::try_join!(
        state
            .db
            .checkin_facts(target.clone(), window, CheckinTimestamp::Submitted),
        state
            .db
            .shoutout_facts(target.clone(), window, Direction::Given, Visibility::All),
    )?;
    Ok(PeriodTotals::from_facts(&checkins, &shoutouts))
}

/// `/api/analytics/overview`: headline numbers for the window against the
/// preceding window of the same length.
pub async fn get_overview(
    state: &AppState,
    caller_id: &str,
    query: &AnalyticsQuery,
) -> Result<Overview, AnalyticsError> {
    let ctx = authorize_request(state, caller_id, Endpoint::Overview, query).await?;
    let (current, previous) = tokio::try_join!(
        period_totals(state, &ctx.target, ctx.window),
        period_totals(state, &ctx.target, ctx.window.previous()),
    )?;
    Ok(Overview::compare(ctx.window, current, previous))
}

pub async fn get_pulse(
    state: &AppState,
    caller_id: &str,
    query: &AnalyticsQuery,
) -> Result<Vec<PulsePoint>, AnalyticsError> {
    let ctx = authorize_request(state, caller_id, Endpoint::Pulse, query).await?;
    let facts = state
        .db
        .checkin_facts(ctx.target, ctx.window, CheckinTimestamp::Submitted)
        .await?;
    Ok(pulse_series(query.period, &facts))
}

pub async fn get_shoutouts(
    state: &AppState,
    caller_id: &str,
    query: &AnalyticsQuery,
) -> Result<Vec<ShoutoutPoint>, AnalyticsError> {
    let ctx = authorize_request(state, caller_id, Endpoint::Shoutouts, query).await?;
    let facts = state
        .db
        .shoutout_facts(
            ctx.target,
            ctx.window,
            query.direction.unwrap_or_default(),
            query.visibility.unwrap_or_default(),
        )
        .await?;
    Ok(shoutout_series(query.period, &facts))
}

pub async fn get_leaderboard(
    state: &AppState,
    caller_id: &str,
    query: &AnalyticsQuery,
) -> Result<Leaderboard, AnalyticsError> {
    let ctx = authorize_request(state, caller_id, Endpoint::Leaderboard, query).await?;
    let metric = query.metric.unwrap_or_default();
    let limit = state.settings.analytics().clamped_limit(query.limit);

    let board = match metric {
        LeaderboardMetric::PulseAvg => {
            let facts = state
                .db
                .checkin_facts(ctx.target, ctx.window, CheckinTimestamp::Submitted)
                .await?;
            rank(metric, &facts, &[], limit)
        }
        LeaderboardMetric::ShoutoutsReceived | LeaderboardMetric::ShoutoutsGiven => {
            let direction = if metric == LeaderboardMetric::ShoutoutsGiven {
                Direction::Given
            } else {
                Direction::Received
            };
            let facts = state
                .db
                .shoutout_facts(ctx.target, ctx.window, direction, Visibility::All)
                .await?;
            rank(metric, &[], &facts, limit)
        }
    };
    Ok(board)
}

pub async fn get_checkin_compliance(
    state: &AppState,
    caller_id: &str,
    query: &AnalyticsQuery,
) -> Result<Compliance, AnalyticsError> {
    let ctx = authorize_request(state, caller_id, Endpoint::CheckinCompliance, query).await?;
    let facts = state
        .db
        .checkin_facts(ctx.target, ctx.window, CheckinTimestamp::Due)
        .await?;
    Ok(checkin_compliance(&facts, Utc::now()))
}

pub async fn get_review_compliance(
    state: &AppState,
    caller_id: &str,
    query: &AnalyticsQuery,
) -> Result<Compliance, AnalyticsError> {
    let ctx = authorize_request(state, caller_id, Endpoint::ReviewCompliance, query).await?;
    let facts = state
        .db
        .checkin_facts(ctx.target, ctx.window, CheckinTimestamp::ReviewDue)
        .await?;
    Ok(review_compliance(&facts, Utc::now()))
}
