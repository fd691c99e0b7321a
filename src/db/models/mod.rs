pub mod checkin;
pub mod organization;
pub mod shoutout;
pub mod user;

pub use checkin::{Checkin, CheckinFact, CheckinTimestamp};
pub use organization::{Organization, Team};
pub use shoutout::{Shoutout, ShoutoutFact};
pub use user::User;
