use std::fmt;

use thiserror::Error;

use crate::session::{OraclePhase, RequestToken};

/// A session transition that was refused. The session is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("upload at least one knowledge file and one requirement to start the debate")]
    GateClosed,

    #[error("a debate cannot be started while {0}")]
    CannotStart(OraclePhase),

    #[error("response for {received} discarded, current request is {current}")]
    StaleToken {
        received: RequestToken,
        current: RequestToken,
    },

    #[error("oracle event discarded while {0}")]
    NotRunning(OraclePhase),

    #[error("results are not available while {0}")]
    NotSettled(OraclePhase),
}

/// Why an alignment attempt failed, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Transport failure: connection refused, timeout, DNS.
    Unavailable,
    /// Non-success status or a payload that is not an alignment result.
    Rejected,
    /// The requirement file could not be read to build the request.
    Unreadable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "oracle unavailable"),
            Self::Rejected => write!(f, "oracle rejected the request"),
            Self::Unreadable => write!(f, "requirement unreadable"),
        }
    }
}

/// Failure surfaced to the session through `ORACLE_FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct OracleFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl OracleFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unavailable, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Rejected, message)
    }

    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unreadable, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display_includes_kind_and_message() {
        let failure = OracleFailure::rejected("server returned 502: bad gateway");
        assert_eq!(
            failure.to_string(),
            "oracle rejected the request: server returned 502: bad gateway"
        );
    }
}
