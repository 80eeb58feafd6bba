use std::time::Duration;

use thiserror::Error;

/// Why a single probe produced no value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("{probe} failed: {reason}")]
    Failed { probe: &'static str, reason: String },

    #[error("{probe} timed out after {}ms", .timeout.as_millis())]
    TimedOut {
        probe: &'static str,
        timeout: Duration,
    },

    #[error("{probe} worker stopped: {reason}")]
    Worker { probe: &'static str, reason: String },
}

impl ProbeError {
    pub fn failed(probe: &'static str, err: &anyhow::Error) -> Self {
        Self::Failed {
            probe,
            reason: format!("{err:#}"),
        }
    }

    pub fn probe(&self) -> &'static str {
        match self {
            Self::Failed { probe, .. } | Self::TimedOut { probe, .. } | Self::Worker { probe, .. } => {
                probe
            }
        }
    }
}

/// Result of one probe. Failures keep their reason so the orchestrator can log
/// and record them before substituting an empty value.
#[derive(Debug)]
pub enum ProbeOutcome<T> {
    Ok(T),
    Failed(ProbeError),
}

impl<T> ProbeOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn error(&self) -> Option<&ProbeError> {
        match self {
            Self::Ok(_) => None,
            Self::Failed(err) => Some(err),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Failed(_) => None,
        }
    }
}

impl<T: Default> ProbeOutcome<T> {
    pub fn unwrap_or_default(self) -> T {
        self.ok().unwrap_or_default()
    }
}
