//! SQLite storage: a single worker thread owns the connection and runs the
//! closures queued by the async repository methods.

mod connection;
pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use repositories::NewUser;
