use thiserror::Error;

use crate::scope::{Role, Scope};

/// Failures surfaced by the analytics endpoints.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("unknown or inactive caller {0}")]
    UnknownCaller(String),

    #[error("{role} callers may not read {scope} analytics for {id}")]
    Forbidden { role: Role, scope: Scope, id: String },

    #[error("{scope} scope requires an id")]
    MissingId { scope: Scope },

    #[error("invalid {field}: {value}")]
    InvalidParam { field: &'static str, value: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AnalyticsError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParam {
            field,
            value: value.into(),
        }
    }

    /// True for failures caused by who is asking rather than by the backend.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::UnknownCaller(_) | Self::Forbidden { .. } | Self::NotFound { .. }
        )
    }
}
