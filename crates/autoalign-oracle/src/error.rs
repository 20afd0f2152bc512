use autoalign_core::{FailureKind, OracleFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("malformed alignment result: {0}")]
    Json(#[from] serde_json::Error),
}

impl OracleError {
    /// Transport problems are `Unavailable`; anything the server said that is
    /// not a usable result is `Rejected`.
    pub fn kind(&self) -> FailureKind {
        match self {
            #[cfg(feature = "http")]
            Self::Http(_) => FailureKind::Unavailable,
            Self::Unavailable(_) => FailureKind::Unavailable,
            Self::Server { .. } | Self::Json(_) => FailureKind::Rejected,
        }
    }
}

impl From<OracleError> for OracleFailure {
    fn from(err: OracleError) -> Self {
        OracleFailure::new(err.kind(), err.to_string())
    }
}
