//! # Cascade Controller
//!
//! The state machine behind the funnel. A selection change at stage *i*:
//!
//! 1. records (or clears) the value at *i*,
//! 2. resets every stage after *i* to `Empty` and repaints it,
//! 3. reports the one lookup to issue next: stage *i + 1*, keyed by the new value.
//!
//! The controller never performs the lookup itself. The driver issues it,
//! calls [`CascadeController::begin_loading`], and later hands the outcome
//! back through [`populate`](CascadeController::populate) or
//! [`fail`](CascadeController::fail). Nothing beyond *i + 1* is loaded
//! until the user selects at *i + 1*.

use crate::registry::StageDescriptor;
use crate::render::{self, StageView};
use crate::store::{StageSlot, StageSnapshot, StageStore};
use crate::{FilterOption, FunnelError, StageId, StageState};

// =============================================================================
// CASCADE
// =============================================================================

/// What a selection change requires of the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade {
    /// Stage the selection was made on.
    pub stage: StageId,
    /// Whether the selected value actually changed.
    pub changed: bool,
    /// Downstream stages that were reset, nearest first.
    pub reset: Vec<StageId>,
    /// Stage to look up next and the parameter value to send.
    pub next: Option<(StageId, String)>,
}

impl Cascade {
    fn unchanged(stage: StageId) -> Self {
        Self {
            stage,
            changed: false,
            reset: Vec::new(),
            next: None,
        }
    }

    /// True when the selection did not change anything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.changed
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Sole owner of the stage store.
#[derive(Debug)]
pub struct CascadeController<V: StageView> {
    store: StageStore,
    view: V,
}

impl<V: StageView> CascadeController<V> {
    /// Build all six stages `Empty` and paint them once.
    pub fn new(view: V) -> Self {
        let mut controller = Self {
            store: StageStore::new(),
            view,
        };
        for stage in StageId::ALL {
            controller.paint(stage);
        }
        controller
    }

    /// Read access to the store.
    #[must_use]
    pub fn store(&self) -> &StageStore {
        &self.store
    }

    /// Get a slot.
    #[must_use]
    pub fn slot(&self, stage: StageId) -> &StageSlot {
        self.store.slot(stage)
    }

    /// The attached view.
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Serializable copy of every stage.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StageSnapshot> {
        self.store.snapshot()
    }

    /// Selected values in funnel order.
    #[must_use]
    pub fn selections(&self) -> Vec<(&'static StageDescriptor, &str)> {
        self.store.selections()
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Handle a selection change at `stage`. An empty `value` clears it.
    ///
    /// Downstream stages are reset before this returns, so no option list
    /// that contradicts the new selection survives while the next lookup
    /// is pending. Invalid input is rejected without touching state.
    pub fn select(&mut self, stage: StageId, value: &str) -> Result<Cascade, FunnelError> {
        let slot = self.store.slot(stage);
        if !slot.is_enabled() {
            return Err(FunnelError::StageDisabled(stage));
        }
        if !value.is_empty() && !slot.offers(value) {
            return Err(FunnelError::UnknownOption {
                stage,
                value: value.to_string(),
            });
        }

        let chosen = (!value.is_empty()).then(|| value.to_string());
        if chosen.as_deref() == slot.selected() {
            return Ok(Cascade::unchanged(stage));
        }

        let slot = self.store.slot_mut(stage);
        slot.state = if chosen.is_some() {
            StageState::Selected
        } else {
            StageState::Populated
        };
        slot.selected.clone_from(&chosen);
        self.paint(stage);

        let reset: Vec<StageId> = stage.downstream().collect();
        for &downstream in &reset {
            self.store.slot_mut(downstream).reset();
            self.paint(downstream);
        }

        let next = chosen.and_then(|v| stage.next().map(|n| (n, v)));
        Ok(Cascade {
            stage,
            changed: true,
            reset,
            next,
        })
    }

    // =========================================================================
    // LOOKUP OUTCOMES
    // =========================================================================

    /// Mark `stage` as waiting on a lookup: placeholder only, disabled.
    pub fn begin_loading(&mut self, stage: StageId) {
        let slot = self.store.slot_mut(stage);
        slot.reset();
        slot.state = StageState::Loading;
        self.paint(stage);
    }

    /// Render a current lookup result into `stage`.
    pub fn populate(&mut self, stage: StageId, options: Vec<FilterOption>) -> StageState {
        let state = render::render(self.store.slot_mut(stage), options);
        self.paint(stage);
        state
    }

    /// A current lookup failed: revert `stage` to `Empty`.
    pub fn fail(&mut self, stage: StageId) {
        self.store.slot_mut(stage).reset();
        self.paint(stage);
    }

    fn paint(&mut self, stage: StageId) {
        let slot = self.store.slot(stage);
        self.view.render(stage, slot.options(), slot.is_enabled());
    }
}

// =============================================================================
// TESTS
// =============================================================================
