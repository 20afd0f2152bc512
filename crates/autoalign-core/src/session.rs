//! Debate session state machine.
//!
//! Owns the workflow stage, the oracle-call lifecycle, the current round and
//! the normalized message timeline. Every transition runs to completion and
//! either applies fully or returns a [`TransitionError`] with the session
//! untouched.
//!
//! ```text
//!                 start_debate                 oracle_succeeded
//!   Idle ───────────────────────► Running ───────────────────────► Succeeded
//!    ▲                             │   ▲                              │
//!    │                oracle_failed│   │start_debate                  │view_results
//!    │                             ▼   │                              ▼
//!    │                            Failed                       (stage = Output)
//!    │
//!    └──────────── return_to_ingestion (from anywhere) ────────────────┘
//! ```
//!
//! Each `start_debate` issues a fresh [`RequestToken`]. Oracle events carry the
//! token they were issued for and are discarded unless it matches the live
//! one, which is how a response to a call made before a reset is ignored.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::alignment::AlignmentResult;
use crate::error::{OracleFailure, TransitionError};
use crate::normalize::{self, Message, Role};
use crate::upload::UploadRegistry;

/// Top-level workflow phase shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ingestion,
    Debate,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingestion => write!(f, "ingestion"),
            Self::Debate => write!(f, "debate"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Lifecycle of the single oracle call a session may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OraclePhase {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for OraclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Correlates an oracle response with the `start_debate` that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request #{}", self.0)
    }
}

/// The one live debate session.
#[derive(Debug, Clone)]
pub struct Session {
    stage: Stage,
    phase: OraclePhase,
    current_round: u32,
    messages: Vec<Message>,
    last_result: Option<AlignmentResult>,
    last_error: Option<OracleFailure>,
    /// Most recently issued token. Survives resets so it only ever grows.
    token: RequestToken,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: Stage::Ingestion,
            phase: OraclePhase::Idle,
            current_round: 1,
            messages: Vec::new(),
            last_result: None,
            last_error: None,
            token: RequestToken(0),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn phase(&self) -> OraclePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == OraclePhase::Running
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_result(&self) -> Option<&AlignmentResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&OracleFailure> {
        self.last_error.as_ref()
    }

    /// Token of the call currently in flight, if any.
    pub fn live_token(&self) -> Option<RequestToken> {
        self.is_running().then_some(self.token)
    }

    pub fn defender_messages(&self) -> impl Iterator<Item = &Message> {
        normalize::by_role(&self.messages, Role::Defender)
    }

    pub fn drafter_messages(&self) -> impl Iterator<Item = &Message> {
        normalize::by_role(&self.messages, Role::Drafter)
    }

    /// `START_DEBATE`: enter the debate stage in a loading posture and issue
    /// a token for the oracle call the caller is about to make.
    ///
    /// Accepted only from `Idle` or `Failed` and only when `uploads` passes the
    /// start gate.
    pub fn start_debate(
        &mut self,
        uploads: &UploadRegistry,
    ) -> Result<RequestToken, TransitionError> {
        if !uploads.can_start_debate() {
            return Err(TransitionError::GateClosed);
        }
        if !matches!(self.phase, OraclePhase::Idle | OraclePhase::Failed) {
            return Err(TransitionError::CannotStart(self.phase));
        }

        self.token = RequestToken(self.token.0 + 1);
        self.stage = Stage::Debate;
        self.phase = OraclePhase::Running;
        self.current_round = 1;
        self.messages.clear();
        self.last_result = None;
        self.last_error = None;

        info!(token = self.token.0, "debate started");
        Ok(self.token)
    }

    /// `ORACLE_SUCCEEDED`, timestamping messages with the current time.
    pub fn oracle_succeeded(
        &mut self,
        token: RequestToken,
        result: AlignmentResult,
    ) -> Result<(), TransitionError> {
        self.oracle_succeeded_at(token, result, Utc::now())
    }

    /// `ORACLE_SUCCEEDED` with an explicit clock for the message timeline.
    pub fn oracle_succeeded_at(
        &mut self,
        token: RequestToken,
        result: AlignmentResult,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.ensure_live(token)?;

        self.messages = normalize::normalize(&result, now);
        if let Some(rounds) = result.rounds_used() {
            self.current_round = rounds;
        }
        self.phase = OraclePhase::Succeeded;

        info!(
            token = token.0,
            status = result.status.as_ref().map(|s| s.as_str()).unwrap_or("-"),
            messages = self.messages.len(),
            round = self.current_round,
            "alignment result received"
        );
        self.last_result = Some(result);
        Ok(())
    }

    /// `ORACLE_FAILED`: stay on the debate stage with cleared panels.
    pub fn oracle_failed(
        &mut self,
        token: RequestToken,
        failure: OracleFailure,
    ) -> Result<(), TransitionError> {
        self.ensure_live(token)?;

        warn!(token = token.0, error = %failure, "alignment failed");
        self.phase = OraclePhase::Failed;
        self.messages.clear();
        self.last_error = Some(failure);
        Ok(())
    }

    /// `VIEW_RESULTS`: the only way into the output stage.
    pub fn view_results(&mut self) -> Result<(), TransitionError> {
        if self.phase != OraclePhase::Succeeded {
            return Err(TransitionError::NotSettled(self.phase));
        }
        self.stage = Stage::Output;
        info!("viewing aligned output");
        Ok(())
    }

    /// `RETURN_TO_INGESTION`: reset everything except the token counter.
    ///
    /// Uploads live outside the session and are unaffected.
    pub fn return_to_ingestion(&mut self) {
        let token = self.token;
        *self = Self {
            token,
            ..Self::new()
        };
        info!("session reset to ingestion");
    }

    fn ensure_live(&self, token: RequestToken) -> Result<(), TransitionError> {
        if self.phase != OraclePhase::Running {
            return Err(TransitionError::NotRunning(self.phase));
        }
        if token != self.token {
            return Err(TransitionError::StaleToken {
                received: token,
                current: self.token,
            });
        }
        Ok(())
    }
}
