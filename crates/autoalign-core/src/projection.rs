//! Progress and visualization projection.
//!
//! Stateless derivations from a [`Session`]: panel contents, counters,
//! percent complete, turn alternation and the summary label. Nothing here
//! mutates the session.

use serde::Serialize;

use crate::config::SessionConfig;
use crate::error::OracleFailure;
use crate::normalize::{Message, Role};
use crate::session::{OraclePhase, Session, Stage};

/// What a role's message panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel<'a> {
    /// Oracle call in flight.
    Loading,
    /// Defender only: the debate settled and found nothing. Distinct from an
    /// empty `Messages` because it signals a clean compliance pass.
    NoViolations,
    Failed(&'a OracleFailure),
    Messages(Vec<&'a Message>),
}

impl Panel<'_> {
    pub fn message_count(&self) -> usize {
        match self {
            Self::Messages(m) => m.len(),
            _ => 0,
        }
    }
}

/// Panel contents for `role`.
pub fn panel(session: &Session, role: Role) -> Panel<'_> {
    match session.phase() {
        OraclePhase::Running => return Panel::Loading,
        OraclePhase::Failed => {
            if let Some(err) = session.last_error() {
                return Panel::Failed(err);
            }
        }
        _ => {}
    }

    let messages: Vec<&Message> = match role {
        Role::Defender => session.defender_messages().collect(),
        Role::Drafter => session.drafter_messages().collect(),
    };
    if role == Role::Defender && messages.is_empty() && session.phase() == OraclePhase::Succeeded {
        return Panel::NoViolations;
    }
    Panel::Messages(messages)
}

/// `100 × current / total`, clamped to `[0, 100]`. A zero ceiling yields 0.
pub fn percent_complete(current_round: u32, total_rounds: u32) -> f64 {
    if total_rounds == 0 {
        return 0.0;
    }
    (100.0 * f64::from(current_round) / f64::from(total_rounds)).clamp(0.0, 100.0)
}

/// Which role holds focus after `ticks` alternations. Starts on the defender.
pub fn turn_focus(ticks: u64) -> Role {
    if ticks % 2 == 0 {
        Role::Defender
    } else {
        Role::Drafter
    }
}

/// One-line verdict shown in the debate footer.
pub fn summary_label(session: &Session) -> String {
    match session.last_result() {
        Some(result) if result.is_aligned() => "Fully Aligned".to_string(),
        _ if session.is_running() => "Processing...".to_string(),
        result => format!(
            "Partially Aligned ({}%)",
            result.map(|r| r.score_percent()).unwrap_or(0.0)
        ),
    }
}

/// Counters for the progress section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebateProgress {
    pub current_round: u32,
    pub total_rounds: u32,
    pub percent_complete: f64,
    pub violations: usize,
    pub resolutions: usize,
    pub debating: bool,
}

impl DebateProgress {
    pub fn from_session(session: &Session, config: &SessionConfig) -> Self {
        let current_round = session.current_round();
        Self {
            current_round,
            total_rounds: config.total_rounds,
            percent_complete: percent_complete(current_round, config.total_rounds),
            violations: session.defender_messages().count(),
            resolutions: session.drafter_messages().count(),
            debating: session.is_running(),
        }
    }

    /// Headline and detail for the status box.
    pub fn status(&self) -> (&'static str, &'static str) {
        if self.debating {
            ("Debate in progress", "Agents are analyzing and debating...")
        } else {
            ("Debate paused", "Ready to continue")
        }
    }
}

/// State of the back-and-forth animation between the two agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnView {
    pub round: u32,
    pub debating: bool,
    pub focus: Role,
}

/// Everything the debate arena renders, derived in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena<'a> {
    pub stage: Stage,
    pub phase: OraclePhase,
    pub defender: Panel<'a>,
    pub drafter: Panel<'a>,
    pub progress: DebateProgress,
    pub turn: TurnView,
    pub summary: String,
    pub can_view_results: bool,
}

impl<'a> Arena<'a> {
    /// `ticks` is the number of alternations observed while running; callers
    /// stop advancing it once the oracle call settles, which freezes `focus`.
    pub fn project(session: &'a Session, config: &SessionConfig, ticks: u64) -> Self {
        Self {
            stage: session.stage(),
            phase: session.phase(),
            defender: panel(session, Role::Defender),
            drafter: panel(session, Role::Drafter),
            progress: DebateProgress::from_session(session, config),
            turn: TurnView {
                round: session.current_round(),
                debating: session.is_running(),
                focus: turn_focus(ticks),
            },
            summary: summary_label(session),
            can_view_results: session.phase() == OraclePhase::Succeeded,
        }
    }
}
