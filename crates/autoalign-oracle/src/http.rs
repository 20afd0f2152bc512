//! HTTP transport for the alignment oracle.

use std::time::Duration;

use async_trait::async_trait;
use autoalign_core::{AlignmentRequest, AlignmentResult};
use tracing::info;

use crate::{Oracle, OracleError};

/// Endpoint of a locally running alignment service.
pub const DEFAULT_ORACLE_URL: &str = "http://localhost:8000/api/align";

/// Posts alignment requests as JSON and parses the JSON reply.
pub struct HttpOracle {
    client: reqwest::Client,
    url: String,
}

impl HttpOracle {
    /// Create a client for the full endpoint URL, e.g. `http://localhost:8000/api/align`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Like [`HttpOracle::new`] but gives up after `timeout`.
    ///
    /// A timed-out call surfaces as an unavailable oracle.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn align(&self, request: &AlignmentRequest) -> Result<AlignmentResult, OracleError> {
        info!(
            url = %self.url,
            max_iterations = request.max_iterations,
            subject_bytes = request.subject_text.len(),
            "requesting alignment"
        );
        let resp = self.client.post(&self.url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        // Read text first so a bad payload is a parse error, not a transport one.
        let body = resp.text().await?;
        let result = AlignmentResult::parse(&body)?;
        info!(
            status = result.status.as_ref().map(|s| s.as_str()).unwrap_or("-"),
            iterations_used = ?result.iterations_used,
            entries = result.audit_trail.len(),
            "alignment received"
        );
        Ok(result)
    }
}
