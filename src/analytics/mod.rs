//! Pure aggregation over the facts returned by `db::repositories::analytics`.
//! Nothing here touches storage or checks permissions.

pub mod compliance;
pub mod leaderboard;
pub mod overview;
pub mod series;

pub use compliance::{checkin_compliance, review_compliance, Compliance};
pub use leaderboard::{rank, Leaderboard, LeaderboardEntry, MAX_LEADERBOARD_LIMIT};
pub use overview::{percent_change, Overview, OverviewMetric, PeriodTotals};
pub use series::{bucket_start, pulse_series, shoutout_series, PulsePoint, ShoutoutPoint};
