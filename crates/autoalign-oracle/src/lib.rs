//! Alignment oracle client: one call-and-wait per debate, no retries.

mod error;
pub use error::OracleError;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{DEFAULT_ORACLE_URL, HttpOracle};

use async_trait::async_trait;
use autoalign_core::{AlignmentRequest, AlignmentResult};

/// The external alignment computation.
///
/// Implementations suspend until the remote side answers and return exactly
/// one of a result or an [`OracleError`]. Retry policy belongs to the caller.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn align(&self, request: &AlignmentRequest) -> Result<AlignmentResult, OracleError>;
}
