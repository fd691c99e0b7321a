use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "member" => Some(Role::Member),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation granularity a query is restricted to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Organization,
    Team,
    User,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Organization => "organization",
            Scope::Team => "team",
            Scope::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "organization" => Some(Scope::Organization),
            "team" => Some(Scope::Team),
            "user" => Some(Scope::User),
            _ => None,
        }
    }

    pub fn requires_id(&self) -> bool {
        !matches!(self, Scope::Organization)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity a read is evaluated for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: String,
    pub organization_id: String,
    pub role: Role,
    pub team_id: Option<String>,
}

/// A fully-specified scope: every variant carries the entity it is bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum ScopeTarget {
    Organization(String),
    Team(String),
    User(String),
}

impl ScopeTarget {
    pub fn scope(&self) -> Scope {
        match self {
            ScopeTarget::Organization(_) => Scope::Organization,
            ScopeTarget::Team(_) => Scope::Team,
            ScopeTarget::User(_) => Scope::User,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ScopeTarget::Organization(id) | ScopeTarget::Team(id) | ScopeTarget::User(id) => id,
        }
    }
}
