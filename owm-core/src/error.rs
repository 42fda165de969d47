use std::{io, time::Duration};

use thiserror::Error;

use crate::model::ForecastKind;

/// Failure of a single fetch.
///
/// A field that could not be scraped is never an error; it simply reads as "no value".
#[derive(Debug, Error)]
pub enum FetchError {
    /// Rejected before any network activity.
    #[error("{kind} forecast supports at most {max} entries, {requested} requested")]
    InvalidArgument {
        kind: ForecastKind,
        requested: u32,
        max: u32,
    },

    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// No response byte arrived within the first-byte bound.
    #[error("No response from server within {0:?}")]
    Timeout(Duration),

    /// The connection broke while the request or response was in flight.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),
}

/// Coarse outcome of a fetch, for callers that only branch on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    Failed,
    InvalidArgument,
}

impl FetchError {
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchError::InvalidArgument { .. } => FetchStatus::InvalidArgument,
            FetchError::ConnectionFailed { .. }
            | FetchError::Timeout(_)
            | FetchError::Transport(_) => FetchStatus::Failed,
        }
    }
}

impl FetchStatus {
    pub fn of<T>(result: &Result<T, FetchError>) -> Self {
        match result {
            Ok(_) => FetchStatus::Success,
            Err(e) => e.status(),
        }
    }
}
