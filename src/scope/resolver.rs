//! Role-based scope clamping.
//!
//! The dashboard runs `resolve_scope` to keep its filters legal; the endpoints
//! run `authorize`, which applies the same rules and is the one that counts.
//! A disallowed request is downgraded to the caller's widest permitted scope
//! instead of being rejected.

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

use super::types::{Caller, Role, Scope, ScopeTarget};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Scope and entity a caller ends up with after clamping. `id` may still be
/// missing when the caller is allowed to pick one (admins, managers in user
/// scope).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowedScope {
    pub scope: Scope,
    pub id: Option<String>,
}

impl AllowedScope {
    /// Binds the scope to a concrete entity. `None` means the selection is
    /// incomplete and no query should be issued.
    pub fn target(&self, organization_id: &str) -> Option<ScopeTarget> {
        match self.scope {
            Scope::Organization => Some(ScopeTarget::Organization(organization_id.to_string())),
            Scope::Team => self.id.clone().map(ScopeTarget::Team),
            Scope::User => self.id.clone().map(ScopeTarget::User),
        }
    }
}

pub fn resolve_scope(caller: &Caller, requested: Scope, requested_id: Option<&str>) -> AllowedScope {
    let requested_id = requested_id.filter(|id| !id.is_empty());

    let allowed = match caller.role {
        Role::Admin => AllowedScope {
            scope: requested,
            id: requested_id.map(str::to_string),
        },
        Role::Manager => match (requested, caller.team_id.as_ref()) {
            (Scope::User, _) => AllowedScope {
                scope: Scope::User,
                id: requested_id.map(str::to_string),
            },
            (Scope::Organization | Scope::Team, Some(team_id)) => AllowedScope {
                scope: Scope::Team,
                id: Some(team_id.clone()),
            },
            (Scope::Organization | Scope::Team, None) => own_user(caller),
        },
        Role::Member => own_user(caller),
    };

    if allowed.scope != requested || allowed.id.as_deref() != requested_id {
        log_info!(
            "clamped {} request {}:{} to {}:{}",
            caller.role,
            requested,
            requested_id.unwrap_or("-"),
            allowed.scope,
            allowed.id.as_deref().unwrap_or("-")
        );
    }

    allowed
}

/// Server-side counterpart of `resolve_scope`: same clamping, but an
/// incomplete selection is an error instead of a disabled query.
pub fn authorize(
    caller: &Caller,
    requested: Scope,
    requested_id: Option<&str>,
) -> Result<ScopeTarget, AnalyticsError> {
    let allowed = resolve_scope(caller, requested, requested_id);
    allowed
        .target(&caller.organization_id)
        .ok_or(AnalyticsError::MissingId {
            scope: allowed.scope,
        })
}

fn own_user(caller: &Caller) -> AllowedScope {
    AllowedScope {
        scope: Scope::User,
        id: Some(caller.user_id.clone()),
    }
}
