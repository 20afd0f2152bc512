//! Aligned output report.
//!
//! Built from a settled session for the output stage and for the export side
//! action. Rendering never feeds back into the session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::normalize::{Message, Severity};
use crate::projection::summary_label;
use crate::session::{OraclePhase, Session};

/// Qualitative band for a compliance percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    NeedsReview,
}

impl ScoreBand {
    /// `Excellent` from 90, `Good` from 70.
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 90.0 {
            Self::Excellent
        } else if percent >= 70.0 {
            Self::Good
        } else {
            Self::NeedsReview
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsReview => "Needs Review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

impl From<&Message> for Finding {
    fn from(m: &Message) -> Self {
        Self {
            title: m.title.clone(),
            body: m.body.clone(),
            severity: m.severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedReport {
    pub status: String,
    pub summary: String,
    pub compliance_percent: f64,
    pub band: ScoreBand,
    pub rounds_used: u32,
    pub violations: Vec<Finding>,
    pub resolutions: Vec<Finding>,
    pub generated_at: DateTime<Utc>,
}

impl AlignedReport {
    /// `None` unless the session holds a successful result.
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Option<Self> {
        if session.phase() != OraclePhase::Succeeded {
            return None;
        }
        let result = session.last_result()?;
        let percent = result.score_percent();
        Some(Self {
            status: result
                .status
                .as_ref()
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            summary: summary_label(session),
            compliance_percent: percent,
            band: ScoreBand::from_percent(percent),
            rounds_used: session.current_round(),
            violations: session.defender_messages().map(Finding::from).collect(),
            resolutions: session.drafter_messages().map(Finding::from).collect(),
            generated_at: now,
        })
    }

    pub fn render(&self, format: ExportFormat) -> Result<String, serde_json::Error> {
        match format {
            ExportFormat::Markdown => Ok(self.to_markdown()),
            ExportFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    pub fn to_markdown(&self) -> String {
        self.to_string()
    }
}

/// Markdown rendering.
impl fmt::Display for AlignedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Aligned Output\n")?;
        writeln!(f, "- **Status:** {} ({})", self.status, self.summary)?;
        writeln!(
            f,
            "- **Compliance:** {}% ({})",
            self.compliance_percent,
            self.band.label()
        )?;
        writeln!(f, "- **Rounds used:** {}", self.rounds_used)?;
        writeln!(f, "- **Generated:** {}\n", self.generated_at.to_rfc3339())?;

        writeln!(f, "## Violations Found\n")?;
        if self.violations.is_empty() {
            writeln!(f, "_No violations found._")?;
        }
        write_findings(f, &self.violations)?;

        writeln!(f, "\n## Resolutions\n")?;
        if self.resolutions.is_empty() {
            writeln!(f, "_No resolutions proposed._")?;
        }
        write_findings(f, &self.resolutions)
    }
}

fn write_findings(f: &mut fmt::Formatter<'_>, findings: &[Finding]) -> fmt::Result {
    for finding in findings {
        writeln!(
            f,
            "- **{}** [{}]: {}",
            finding.title, finding.severity, finding.body
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{AlignmentResult, AlignmentStatus, AuditEntry};
    use crate::upload::{Category, UploadRegistry, UploadedFile};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn settled(result: AlignmentResult) -> Session {
        let mut uploads = UploadRegistry::new();
        uploads.add(Category::Knowledge, vec![UploadedFile::from_text("k", "k")]);
        uploads.add(Category::Requirement, vec![UploadedFile::from_text("r", "r")]);
        let mut s = Session::new();
        let token = s.start_debate(&uploads).unwrap();
        s.oracle_succeeded_at(token, result, now()).unwrap();
        s
    }

    fn partial() -> AlignmentResult {
        AlignmentResult {
            status: Some(AlignmentStatus::Partial),
            compliance_score: Some(0.88),
            iterations_used: Some(2),
            audit_trail: vec![
                AuditEntry {
                    agent: Some("defender".into()),
                    iteration: Some(1),
                    summary: Some("Consent is not collected.".into()),
                    ..Default::default()
                },
                AuditEntry {
                    agent: Some("drafter".into()),
                    iteration: Some(1),
                    summary: Some("Added tiered opt-in consent.".into()),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::from_percent(95.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_percent(90.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_percent(88.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percent(70.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percent(69.9), ScoreBand::NeedsReview);
    }

    #[test]
    fn report_requires_success() {
        assert!(AlignedReport::from_session(&Session::new(), now()).is_none());
    }

    #[test]
    fn report_from_partial_result() {
        let report = AlignedReport::from_session(&settled(partial()), now()).unwrap();
        assert_eq!(report.status, "PARTIAL");
        assert_eq!(report.summary, "Partially Aligned (88%)");
        assert_eq!(report.compliance_percent, 88.0);
        assert_eq!(report.band, ScoreBand::Good);
        assert_eq!(report.rounds_used, 2);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.resolutions[0].body, "Added tiered opt-in consent.");
    }

    #[test]
    fn markdown_lists_findings() {
        let md = AlignedReport::from_session(&settled(partial()), now())
            .unwrap()
            .to_markdown();
        assert!(md.starts_with("# Aligned Output"));
        assert!(md.contains("- **Compliance:** 88% (Good)"));
        assert!(md.contains("- **Round 1 Analysis** [high]: Consent is not collected."));
        assert!(md.contains("- **Round 1 Resolution** [medium]: Added tiered opt-in consent."));
    }

    #[test]
    fn markdown_layout_is_stable() {
        let report = AlignedReport::from_session(&settled(partial()), now()).unwrap();
        let md = report.to_markdown();
        assert_eq!(md, format!("{report}"));
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "# Aligned Output");
        assert_eq!(lines[2], "- **Status:** PARTIAL (Partially Aligned (88%))");
        assert_eq!(lines[5], "- **Generated:** 2026-03-01T12:00:00+00:00");
        assert_eq!(lines[7], "## Violations Found");
        assert!(md.ends_with("Added tiered opt-in consent.\n"));
    }

    #[test]
    fn markdown_for_clean_pass() {
        let s = settled(AlignmentResult {
            status: Some(AlignmentStatus::Aligned),
            compliance_score: Some(1.0),
            iterations_used: Some(1),
            audit_trail: vec![],
        });
        let md = AlignedReport::from_session(&s, now()).unwrap().to_markdown();
        assert!(md.contains("_No violations found._"));
        assert!(md.contains("(Fully Aligned)"));
        assert!(md.contains("100% (Excellent)"));
    }

    #[test]
    fn json_export_uses_snake_case() {
        let report = AlignedReport::from_session(&settled(partial()), now()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&report.render(ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["band"], "good");
        assert_eq!(json["violations"][0]["severity"], "high");
        assert_eq!(json["rounds_used"], 2);
    }
}
