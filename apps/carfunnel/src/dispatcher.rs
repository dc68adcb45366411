//! # Query Dispatcher
//!
//! Issues one asynchronous lookup per stage transition and brings each
//! completion back to the session task that owns stage state.
//!
//! Every lookup runs as its own tokio task; its result travels over an
//! unbounded channel as a [`Completion`]. The session receives it on its
//! own task and passes it to [`Dispatcher::accept`], which compares the
//! completion's sequence with the ledger. Only the latest request per stage
//! is ever forwarded; superseded ones are dropped here.
//!
//! Failures never leave this module: transport errors and malformed bodies
//! are logged and folded into an empty option list. A lookup task that dies
//! (panics or is cancelled) is reported as a transport failure, so every
//! dispatched request produces exactly one completion.

use crate::lookup::Lookup;
use carfunnel_core::{
    FilterOption, LookupError, Request, Sequence, SequenceLedger, StageId, registry,
};
use std::sync::Arc;
use tokio::sync::mpsc;

// =============================================================================
// COMPLETION & VERDICT
// =============================================================================

/// A finished lookup, delivered back to the session task.
#[derive(Debug)]
pub struct Completion {
    /// The request as it was issued.
    pub request: Request,
    /// What the lookup produced.
    pub result: Result<Vec<FilterOption>, LookupError>,
}

/// The dispatcher's judgement of a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A newer request exists for the stage; nothing to do.
    Stale {
        stage: StageId,
        sequence: Sequence,
    },
    /// The latest request for `stage` finished.
    Current {
        stage: StageId,
        options: Vec<FilterOption>,
        /// The lookup hit a network failure (options is empty).
        failed: bool,
    },
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Owns the per-stage sequence ledger and the lookup port.
pub struct Dispatcher<L: Lookup> {
    lookup: Arc<L>,
    ledger: SequenceLedger,
    tx: mpsc::UnboundedSender<Completion>,
    in_flight: usize,
}

impl<L: Lookup> Dispatcher<L> {
    /// Create a dispatcher and the receiving end of its completion channel.
    pub fn new(lookup: L) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            lookup: Arc::new(lookup),
            ledger: SequenceLedger::new(),
            tx,
            in_flight: 0,
        };
        (dispatcher, rx)
    }

    /// Issue a lookup for `stage`. Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, stage: StageId, param: Option<String>) -> Request {
        let request = self.ledger.issue(stage, param);
        let descriptor = registry::descriptor(stage);

        tracing::debug!(
            stage = %stage,
            sequence = %request.sequence,
            endpoint = descriptor.endpoint,
            param = ?request.param,
            "dispatching lookup"
        );

        let lookup = Arc::clone(&self.lookup);
        let tx = self.tx.clone();
        let issued = request.clone();
        self.in_flight = self.in_flight.saturating_add(1);

        let param = issued.param.clone();
        let fetch = tokio::spawn(async move { lookup.fetch(descriptor, param).await });
        tokio::spawn(async move {
            // A dead lookup task still owes the session a completion.
            let result = fetch.await.unwrap_or_else(|e| {
                tracing::error!(stage = %issued.stage, "lookup task died: {}", e);
                Err(LookupError::Transport(format!("lookup task died: {}", e)))
            });
            // A closed channel means the session is gone.
            let _ = tx.send(Completion {
                request: issued,
                result,
            });
        });

        request
    }

    /// Supersede whatever is in flight for `stage`.
    pub fn invalidate(&mut self, stage: StageId) {
        let sequence = self.ledger.invalidate(stage);
        tracing::trace!(stage = %stage, sequence = %sequence, "stage invalidated");
    }

    /// Judge a completion against the ledger.
    pub fn accept(&mut self, completion: Completion) -> Verdict {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completion { request, result } = completion;
        let stage = request.stage;

        if !self.ledger.is_current(&request) {
            tracing::debug!(
                stage = %stage,
                sequence = %request.sequence,
                latest = %self.ledger.latest(stage),
                "discarding stale lookup"
            );
            return Verdict::Stale {
                stage,
                sequence: request.sequence,
            };
        }

        match result {
            Ok(options) => {
                tracing::debug!(stage = %stage, count = options.len(), "lookup complete");
                Verdict::Current {
                    stage,
                    options,
                    failed: false,
                }
            }
            Err(e) if e.is_network() => {
                tracing::warn!(stage = %stage, param = ?request.param, "lookup failed: {}", e);
                Verdict::Current {
                    stage,
                    options: Vec::new(),
                    failed: true,
                }
            }
            Err(e) => {
                tracing::warn!(stage = %stage, param = ?request.param, "{}; treating as no matches", e);
                Verdict::Current {
                    stage,
                    options: Vec::new(),
                    failed: false,
                }
            }
        }
    }

    /// Lookups issued but not yet accepted.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Latest sequence issued for `stage`.
    pub fn latest(&self, stage: StageId) -> Sequence {
        self.ledger.latest(stage)
    }
}
