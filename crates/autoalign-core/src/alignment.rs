//! Wire types exchanged with the alignment oracle.
//!
//! The response model is lenient: a field that is missing, null or of the
//! wrong JSON type reads as `None`, so one malformed audit entry cannot sink
//! the whole payload. Role checks are left to [`crate::normalize`].

use std::fmt;
use std::io;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::SessionConfig;
use crate::upload::UploadRegistry;

/// Body of the `POST` sent to the oracle. Built once per debate start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentRequest {
    #[serde(rename = "brd_content")]
    pub subject_text: String,
    pub max_iterations: u32,
}

impl AlignmentRequest {
    /// `max_iterations` is raised to 1 if zero.
    pub fn new(subject_text: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            subject_text: subject_text.into(),
            max_iterations: max_iterations.max(1),
        }
    }

    /// Use the first requirement's text as the subject, or the configured
    /// fallback when no requirement has been uploaded.
    pub fn from_uploads(uploads: &UploadRegistry, config: &SessionConfig) -> io::Result<Self> {
        let subject = match uploads.primary_requirement() {
            Some(file) => file.read_text()?,
            None => config.fallback_subject.clone(),
        };
        Ok(Self::new(subject, config.max_iterations))
    }
}

/// Overall verdict reported by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlignmentStatus {
    Aligned,
    Partial,
    Other(String),
}

impl AlignmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Aligned => "ALIGNED",
            Self::Partial => "PARTIAL",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for AlignmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ALIGNED" => Self::Aligned,
            "PARTIAL" => Self::Partial,
            _ => Self::Other(s),
        }
    }
}

impl From<AlignmentStatus> for String {
    fn from(status: AlignmentStatus) -> Self {
        match status {
            AlignmentStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for AlignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The oracle's response payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    #[serde(
        default,
        deserialize_with = "lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<AlignmentStatus>,
    /// Expected in `[0, 1]`.
    #[serde(
        default,
        deserialize_with = "lenient_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub compliance_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub iterations_used: Option<i64>,
    /// Entries that are not objects keep their slot as an empty entry.
    #[serde(default, deserialize_with = "lenient_trail")]
    pub audit_trail: Vec<AuditEntry>,
}

impl AlignmentResult {
    /// Parse a response body. Anything other than a JSON object is an error.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom(
                "expected an alignment result object",
            ));
        }
        serde_json::from_value(value)
    }

    pub fn is_aligned(&self) -> bool {
        self.status == Some(AlignmentStatus::Aligned)
    }

    /// Compliance score clamped to `[0, 1]`; missing scores count as zero.
    pub fn score(&self) -> f64 {
        self.compliance_score.unwrap_or(0.0).clamp(0.0, 1.0)
    }

    /// Score as a percentage rounded to one decimal place.
    pub fn score_percent(&self) -> f64 {
        (self.score() * 1000.0).round() / 10.0
    }

    /// Rounds reported by the oracle, if present and positive.
    pub fn rounds_used(&self) -> Option<u32> {
        self.iterations_used
            .filter(|n| *n >= 1)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
    }
}

/// One raw step of the negotiation, as the oracle reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// `"defender"` or `"drafter"`; anything else is skipped by the normalizer.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub iteration: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub violations_addressed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub original_length: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub revised_length: Option<i64>,
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<AlignmentStatus>, D::Error> {
    Ok(lenient_string(deserializer)?.map(AlignmentStatus::from))
}

fn lenient_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

/// Integers as-is; finite floats truncated toward zero.
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    }))
}

fn lenient_trail<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<AuditEntry>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| AuditEntry::deserialize(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{Category, UploadedFile};

    #[test]
    fn request_uses_wire_field_names() {
        let req = AlignmentRequest::new("Keep data forever.", 3);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "brd_content": "Keep data forever.", "max_iterations": 3 })
        );
    }

    #[test]
    fn request_bound_is_positive() {
        assert_eq!(AlignmentRequest::new("x", 0).max_iterations, 1);
    }

    #[test]
    fn request_from_first_requirement() {
        let mut uploads = UploadRegistry::new();
        uploads.add(
            Category::Requirement,
            vec![
                UploadedFile::from_text("brd.md", "Share analytics with partners."),
                UploadedFile::from_text("other.md", "ignored"),
            ],
        );
        let req = AlignmentRequest::from_uploads(&uploads, &SessionConfig::default()).unwrap();
        assert_eq!(req.subject_text, "Share analytics with partners.");
        assert_eq!(req.max_iterations, 3);
    }

    #[test]
    fn request_falls_back_without_requirement() {
        let config = SessionConfig {
            max_iterations: 4,
            ..SessionConfig::default()
        };
        let req = AlignmentRequest::from_uploads(&UploadRegistry::new(), &config).unwrap();
        assert_eq!(req.subject_text, crate::config::FALLBACK_SUBJECT);
        assert_eq!(req.max_iterations, 4);
    }

    #[test]
    fn parse_full_result() {
        let body = r#"{
            "status": "PARTIAL",
            "compliance_score": 0.85,
            "iterations_used": 2,
            "audit_trail": [
                { "agent": "defender", "iteration": 1, "summary": "Retention is unbounded." },
                { "agent": "drafter", "iteration": 1, "violations_addressed": 2,
                  "original_length": 100, "revised_length": 120 }
            ]
        }"#;
        let result = AlignmentResult::parse(body).unwrap();
        assert_eq!(result.status, Some(AlignmentStatus::Partial));
        assert_eq!(result.compliance_score, Some(0.85));
        assert_eq!(result.rounds_used(), Some(2));
        assert_eq!(result.audit_trail.len(), 2);
        assert_eq!(result.audit_trail[0].agent.as_deref(), Some("defender"));
        assert_eq!(result.audit_trail[1].revised_length, Some(120));
    }

    #[test]
    fn parse_tolerates_missing_and_null_fields() {
        let result = AlignmentResult::parse(r#"{ "audit_trail": null, "extra": true }"#).unwrap();
        assert!(result.status.is_none());
        assert!(result.audit_trail.is_empty());
        assert_eq!(result.score(), 0.0);
        assert_eq!(result.rounds_used(), None);
    }

    #[test]
    fn parse_tolerates_mistyped_fields() {
        let body = r#"{
            "status": 1,
            "compliance_score": "high",
            "iterations_used": 2.0,
            "audit_trail": [
                { "agent": "defender", "iteration": 1, "summary": "X" },
                { "agent": 7, "iteration": 1 },
                { "agent": "drafter", "iteration": 1.0, "summary": ["Y"], "revised_length": "120" },
                "not an entry"
            ]
        }"#;
        let result = AlignmentResult::parse(body).unwrap();
        assert!(result.status.is_none());
        assert!(result.compliance_score.is_none());
        assert_eq!(result.rounds_used(), Some(2));
        assert_eq!(result.audit_trail.len(), 4);
        assert!(result.audit_trail[1].agent.is_none());
        assert_eq!(result.audit_trail[1].iteration, Some(1));
        let drafter = &result.audit_trail[2];
        assert_eq!(drafter.agent.as_deref(), Some("drafter"));
        assert_eq!(drafter.iteration, Some(1));
        assert!(drafter.summary.is_none());
        assert!(drafter.revised_length.is_none());
        assert_eq!(result.audit_trail[3], AuditEntry::default());
    }

    #[test]
    fn non_array_trail_reads_as_empty() {
        let result = AlignmentResult::parse(r#"{ "audit_trail": { "agent": "defender" } }"#).unwrap();
        assert!(result.audit_trail.is_empty());
    }

    #[test]
    fn parse_rejects_non_objects() {
        assert!(AlignmentResult::parse("[]").is_err());
        assert!(AlignmentResult::parse("not json").is_err());
        assert!(AlignmentResult::parse("null").is_err());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let result = AlignmentResult::parse(r#"{ "status": "ESCALATED" }"#).unwrap();
        assert_eq!(
            result.status,
            Some(AlignmentStatus::Other("ESCALATED".into()))
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "ESCALATED");
    }

    #[test]
    fn score_percent_rounds_float_noise() {
        let result = AlignmentResult {
            compliance_score: Some(0.57),
            ..Default::default()
        };
        assert_eq!(result.score_percent(), 57.0);

        let over = AlignmentResult {
            compliance_score: Some(1.4),
            ..Default::default()
        };
        assert_eq!(over.score_percent(), 100.0);
    }

    #[test]
    fn non_positive_iterations_are_ignored() {
        let result = AlignmentResult {
            iterations_used: Some(0),
            ..Default::default()
        };
        assert_eq!(result.rounds_used(), None);
    }
}
