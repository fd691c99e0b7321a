pub mod resolver;
pub mod types;

pub use resolver::{authorize, resolve_scope, AllowedScope};
pub use types::{Caller, Role, Scope, ScopeTarget};
