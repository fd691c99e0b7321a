pub mod period;
pub mod query;
pub mod range;
pub mod state;

pub use period::{Direction, LeaderboardMetric, Period, Visibility};
pub use query::{AnalyticsQuery, Endpoint};
pub use range::DateWindow;
pub use state::FilterState;
