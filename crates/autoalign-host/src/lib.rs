//! Debate runtime: feeds user actions and oracle responses to the session
//! state machine one event at a time.
//!
//! - Every event is handled to completion before the next is dequeued
//! - `StartDebate` spawns the oracle call and reports back through the queue
//! - A periodic ticker drives turn alternation while the call is in flight and
//!   is torn down as soon as the session leaves `running`

use std::sync::Arc;
use std::time::Duration;

use autoalign_core::{
    AlignmentRequest, AlignmentResult, Arena, Category, OracleFailure, OraclePhase, RequestToken,
    Session, SessionConfig, TransitionError, UploadRegistry, UploadedFile,
};
use autoalign_oracle::Oracle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A discrete input to the runtime.
#[derive(Debug)]
pub enum Event {
    Upload {
        category: Category,
        files: Vec<UploadedFile>,
    },
    Remove {
        category: Category,
        index: usize,
    },
    StartDebate,
    ViewResults,
    ReturnToIngestion,
    /// The oracle call issued under `token` finished.
    OracleSettled {
        token: RequestToken,
        outcome: Result<AlignmentResult, OracleFailure>,
    },
    /// One turn-alternation step for the call issued under `token`.
    Tick { token: RequestToken },
}

/// Floor for the tick period; a zero period is not a valid interval.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Background task emitting [`Event::Tick`]. Aborted on drop.
struct Ticker {
    token: RequestToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(period: Duration, token: RequestToken, tx: mpsc::UnboundedSender<Event>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period.max(MIN_TICK_INTERVAL));
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(Event::Tick { token }).is_err() {
                    break;
                }
            }
        });
        Self { token, handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Owns the session, the uploads and the event queue.
///
/// Must be used from within a Tokio runtime.
pub struct DebateRuntime {
    session: Session,
    uploads: UploadRegistry,
    config: SessionConfig,
    oracle: Arc<dyn Oracle>,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    ticker: Option<Ticker>,
    ticks: u64,
}

impl DebateRuntime {
    pub fn new(oracle: Arc<dyn Oracle>, config: SessionConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(),
            uploads: UploadRegistry::new(),
            config,
            oracle,
            tx,
            rx,
            ticker: None,
            ticks: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn uploads(&self) -> &UploadRegistry {
        &self.uploads
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Turn alternations observed during the current or last oracle call.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn ticker_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Handle for feeding events from outside, e.g. an input task.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub fn arena(&self) -> Arena<'_> {
        Arena::project(&self.session, &self.config, self.ticks)
    }

    /// Apply one event. Rejected transitions leave all state unchanged.
    pub fn dispatch(&mut self, event: Event) -> Result<(), TransitionError> {
        let outcome = match event {
            Event::Upload { category, files } => {
                self.uploads.add(category, files);
                Ok(())
            }
            Event::Remove { category, index } => {
                self.uploads.remove(category, index);
                Ok(())
            }
            Event::StartDebate => match self.session.start_debate(&self.uploads) {
                Ok(token) => {
                    self.ticks = 0;
                    self.spawn_call(token);
                    Ok(())
                }
                Err(err) => Err(err),
            },
            Event::ViewResults => self.session.view_results(),
            Event::ReturnToIngestion => {
                self.session.return_to_ingestion();
                self.ticks = 0;
                Ok(())
            }
            Event::OracleSettled { token, outcome } => match outcome {
                Ok(result) => self.session.oracle_succeeded(token, result),
                Err(failure) => self.session.oracle_failed(token, failure),
            },
            Event::Tick { token } => {
                if self.session.live_token() == Some(token) {
                    self.ticks += 1;
                } else {
                    debug!(token = token.value(), "stale tick dropped");
                }
                Ok(())
            }
        };
        self.sync_ticker();
        outcome
    }

    /// Wait for the next queued event and apply it.
    ///
    /// Returns `None` only if the queue is closed, which cannot happen while
    /// the runtime holds its own sender.
    pub async fn step(&mut self) -> Option<Result<(), TransitionError>> {
        let event = self.rx.recv().await?;
        Some(self.dispatch(event))
    }

    /// Apply every event already queued without waiting. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            if let Err(err) = self.dispatch(event) {
                debug!(error = %err, "event discarded");
            }
            handled += 1;
        }
        handled
    }

    /// Process events until the oracle call settles, calling `observe` after
    /// each one. Returns immediately if no call is in flight.
    ///
    /// Imposes no timeout; a call that never answers keeps this waiting.
    pub async fn run_until_settled(&mut self, mut observe: impl FnMut(&Arena<'_>)) -> OraclePhase {
        while self.session.is_running() {
            match self.step().await {
                Some(Err(err)) => debug!(error = %err, "event discarded"),
                Some(Ok(())) => {}
                None => break,
            }
            observe(&self.arena());
        }
        self.session.phase()
    }

    fn spawn_call(&self, token: RequestToken) {
        let oracle = Arc::clone(&self.oracle);
        let uploads = self.uploads.clone();
        let config = self.config.clone();
        let tx = self.tx.clone();
        info!(token = token.value(), "dispatching alignment request");
        tokio::spawn(async move {
            let outcome = match AlignmentRequest::from_uploads(&uploads, &config) {
                Ok(request) => oracle.align(&request).await.map_err(OracleFailure::from),
                Err(e) => Err(OracleFailure::unreadable(e.to_string())),
            };
            // A closed queue means the runtime is gone; nobody is waiting.
            let _ = tx.send(Event::OracleSettled { token, outcome });
        });
    }

    /// Keep exactly one ticker alive while running, none otherwise.
    fn sync_ticker(&mut self) {
        let live = self.session.live_token();
        let current = self.ticker.as_ref().map(|t| t.token);
        if live == current {
            return;
        }
        self.ticker = live.map(|token| {
            debug!(token = token.value(), "turn ticker started");
            Ticker::spawn(self.config.tick_interval, token, self.tx.clone())
        });
        if live.is_none() {
            debug!(ticks = self.ticks, "turn ticker stopped");
        }
    }
}
