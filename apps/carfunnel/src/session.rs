//! # Funnel Session
//!
//! The single owner of funnel state at runtime.
//!
//! A session pairs the core [`CascadeController`] with the async
//! [`Dispatcher`] and the receiving end of its completion channel. All
//! mutation happens through `&mut self` on whichever task holds the
//! session; lookup tasks only ever send completions back.
//!
//! ## Lifecycle
//!
//! - `open` paints all six stages `Empty` and dispatches the first stage
//! - `select` cascades: reset downstream, invalidate their lookups,
//!   dispatch exactly the next stage
//! - completions are applied one at a time via `apply` (or `settle`)

use crate::dispatcher::{Completion, Dispatcher, Verdict};
use crate::lookup::Lookup;
use crate::search;
use carfunnel_core::{
    Cascade, CascadeController, FunnelError, Request, Sequence, StageDescriptor, StageId,
    StageSnapshot, StageState, StageView,
};
use tokio::sync::mpsc;

/// What applying a completion did to the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Options were rendered; `state` is the stage's resulting state.
    Rendered { stage: StageId, state: StageState },
    /// The lookup failed; the stage is back to `Empty`.
    Failed { stage: StageId },
    /// The completion was superseded and dropped.
    Discarded { stage: StageId, sequence: Sequence },
}

/// Controller + dispatcher + completion inbox.
pub struct FunnelSession<L: Lookup, V: StageView> {
    controller: CascadeController<V>,
    dispatcher: Dispatcher<L>,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl<L: Lookup, V: StageView> FunnelSession<L, V> {
    /// Build the funnel and start loading the first stage.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(lookup: L, view: V) -> Self {
        let (dispatcher, completions) = Dispatcher::new(lookup);
        let mut session = Self {
            controller: CascadeController::new(view),
            dispatcher,
            completions,
        };
        session.load(StageId::Make, None);
        session
    }

    /// Read access to the controller (and through it, the store and view).
    pub fn controller(&self) -> &CascadeController<V> {
        &self.controller
    }

    /// Serializable copy of every stage.
    pub fn snapshot(&self) -> Vec<StageSnapshot> {
        self.controller.snapshot()
    }

    /// Selected values in funnel order.
    pub fn selections(&self) -> Vec<(&'static StageDescriptor, &str)> {
        self.controller.selections()
    }

    /// Listing URL for the current selections.
    pub fn search_url(&self, base_url: &str) -> Result<reqwest::Url, FunnelError> {
        search::search_url(base_url, &self.selections())
    }

    /// Lookups issued but not yet applied or discarded.
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// The user changed `stage` to `value` (empty clears it).
    pub fn select(&mut self, stage: StageId, value: &str) -> Result<Cascade, FunnelError> {
        let cascade = self.controller.select(stage, value)?;
        for &reset in &cascade.reset {
            self.dispatcher.invalidate(reset);
        }
        if let Some((next, param)) = &cascade.next {
            self.load(*next, Some(param.clone()));
        }
        Ok(cascade)
    }

    /// Re-issue `stage`'s lookup from its parent's current selection.
    ///
    /// Everything after `stage` is reset. This is the only way to retry
    /// the first stage after its initial load failed.
    pub fn reload(&mut self, stage: StageId) -> Result<Request, FunnelError> {
        let param = match stage.previous() {
            None => None,
            Some(parent) => Some(
                self.controller
                    .slot(parent)
                    .selected()
                    .ok_or(FunnelError::StageDisabled(stage))?
                    .to_string(),
            ),
        };

        for downstream in stage.downstream() {
            self.dispatcher.invalidate(downstream);
            self.controller.fail(downstream);
        }
        Ok(self.load(stage, param))
    }

    fn load(&mut self, stage: StageId, param: Option<String>) -> Request {
        let request = self.dispatcher.dispatch(stage, param);
        self.controller.begin_loading(stage);
        request
    }

    // =========================================================================
    // COMPLETIONS
    // =========================================================================

    /// Wait for the next lookup to finish. `None` only if the channel closed.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions.recv().await
    }

    /// Judge a completion and, if current, render it.
    pub fn apply(&mut self, completion: Completion) -> Applied {
        match self.dispatcher.accept(completion) {
            Verdict::Stale { stage, sequence } => Applied::Discarded { stage, sequence },
            Verdict::Current {
                stage,
                failed: true,
                ..
            } => {
                self.controller.fail(stage);
                Applied::Failed { stage }
            }
            Verdict::Current { stage, options, .. } => {
                let state = self.controller.populate(stage, options);
                Applied::Rendered { stage, state }
            }
        }
    }

    /// Apply completions until nothing is in flight.
    pub async fn settle(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while self.in_flight() > 0 {
            let Some(completion) = self.next_completion().await else {
                break;
            };
            applied.push(self.apply(completion));
        }
        applied
    }
}
