use std::time::Duration;

use thiserror::Error;

use crate::error::AnalyticsError;

/// Outcome of a widget fetch that did not produce data. Authorization
/// problems are kept apart from transient ones so the view can tell "you may
/// not see this" from "try again".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),

    #[error("superseded by a newer request")]
    Superseded,
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout(_) | FetchError::Failed(_))
    }
}

impl From<AnalyticsError> for FetchError {
    fn from(err: AnalyticsError) -> Self {
        if err.is_authorization() {
            FetchError::Unauthorized(err.to_string())
        } else {
            FetchError::Failed(err.to_string())
        }
    }
}
