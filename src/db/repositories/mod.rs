pub mod analytics;
pub mod checkins;
pub mod organizations;
pub mod shoutouts;
pub mod users;

pub use users::NewUser;
