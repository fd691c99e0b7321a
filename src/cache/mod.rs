mod error;
mod store;

pub use error::FetchError;
pub use store::{CacheConfig, QueryCache, QueryKey, Ticket};
