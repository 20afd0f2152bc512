//! Audit trail normalization.
//!
//! Maps the oracle's raw audit trail onto a canonical [`Message`] timeline.
//! The mapping never fails: entries with an unrecognised role are skipped,
//! missing optional fields take documented defaults.
//!
//! # Mapping
//!
//! | field      | defender                    | drafter                       |
//! |------------|-----------------------------|-------------------------------|
//! | category   | `violation`                 | `solution`                    |
//! | title      | `Round {n} Analysis`        | `Round {n} Resolution`        |
//! | severity   | `high`                      | `medium`                      |
//!
//! Ids are `msg-{position}` where position is the entry's index in the raw
//! trail, so re-normalizing the same result yields the same ids.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::warn;

use crate::alignment::{AlignmentResult, AuditEntry};

/// The two debating agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Finds violations against the policy corpus.
    Defender,
    /// Proposes resolutions.
    Drafter,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "defender" => Some(Self::Defender),
            "drafter" => Some(Self::Drafter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Defender => "defender",
            Self::Drafter => "drafter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Defender => "Defender",
            Self::Drafter => "Drafter",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Defender => Self::Drafter,
            Self::Drafter => Self::Defender,
        }
    }

    fn category(self) -> MessageCategory {
        match self {
            Self::Defender => MessageCategory::Violation,
            Self::Drafter => MessageCategory::Solution,
        }
    }

    // Presentation heuristic only; the oracle does not report severity.
    fn severity(self) -> Severity {
        match self {
            Self::Defender => Severity::High,
            Self::Drafter => Severity::Medium,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Violation,
    Solution,
    Analysis,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Violation => "violation",
            Self::Solution => "solution",
            Self::Analysis => "analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One displayable step of the debate. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub category: MessageCategory,
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Footer line shown under the message body.
    pub fn status_label(&self) -> &'static str {
        match self.role {
            Role::Defender => "Violation Found",
            Role::Drafter => "Solution Proposed",
        }
    }
}

/// Normalize an oracle result into a message timeline.
///
/// Timestamps count back from `now` one second per remaining kept entry, so
/// ordering by `created_at` equals ordering by position with no gaps. Passing
/// the same `now` makes the output fully deterministic.
pub fn normalize(result: &AlignmentResult, now: DateTime<Utc>) -> Vec<Message> {
    let kept: Vec<(usize, &AuditEntry, Role)> = result
        .audit_trail
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            match entry.agent.as_deref().and_then(Role::parse) {
                Some(role) => Some((position, entry, role)),
                None => {
                    warn!(position, agent = ?entry.agent, "skipping audit entry with unrecognised role");
                    None
                }
            }
        })
        .collect();

    let total = kept.len() as i64;
    kept.into_iter()
        .enumerate()
        .map(|(rank, (position, entry, role))| Message {
            id: format!("msg-{position}"),
            role,
            category: role.category(),
            title: title(role, entry.iteration.filter(|n| *n >= 1).unwrap_or(1)),
            body: body(entry),
            severity: role.severity(),
            created_at: now - TimeDelta::seconds(total - rank as i64),
        })
        .collect()
}

/// Messages from one role, in timeline order.
pub fn by_role(messages: &[Message], role: Role) -> impl Iterator<Item = &Message> {
    messages.iter().filter(move |m| m.role == role)
}

fn title(role: Role, iteration: i64) -> String {
    match role {
        Role::Defender => format!("Round {iteration} Analysis"),
        Role::Drafter => format!("Round {iteration} Resolution"),
    }
}

fn body(entry: &AuditEntry) -> String {
    match entry.summary.as_deref() {
        Some(summary) if !summary.is_empty() => summary.to_string(),
        _ => format!(
            "Addressed {} violations. Original length: {}, Revised: {}.",
            entry.violations_addressed.unwrap_or(0),
            entry.original_length.unwrap_or(0),
            entry.revised_length.unwrap_or(0),
        ),
    }
}
