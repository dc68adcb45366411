//! # Stage Store
//!
//! In-memory state of the six stages.
//!
//! The store is owned by the [`CascadeController`](crate::CascadeController);
//! outside the crate it is read-only. Writes happen in two places only:
//! the controller (selection and reset) and the [`render`](crate::render)
//! module (population).

use crate::registry::{self, StageDescriptor};
use crate::types::STAGE_COUNT;
use crate::{FilterOption, StageId, StageState};
use serde::Serialize;

// =============================================================================
// STAGE SLOT
// =============================================================================

/// Mutable state of one stage.
#[derive(Debug, Clone)]
pub struct StageSlot {
    pub(crate) descriptor: &'static StageDescriptor,
    /// Rendered options, placeholder first.
    pub(crate) options: Vec<FilterOption>,
    pub(crate) selected: Option<String>,
    pub(crate) state: StageState,
}

impl StageSlot {
    /// Create an empty, disabled slot showing only its placeholder.
    #[must_use]
    pub fn new(descriptor: &'static StageDescriptor) -> Self {
        Self {
            descriptor,
            options: vec![FilterOption::placeholder(descriptor.placeholder)],
            selected: None,
            state: StageState::Empty,
        }
    }

    /// Stage identity.
    #[must_use]
    pub fn id(&self) -> StageId {
        self.descriptor.id
    }

    /// Static metadata for this stage.
    #[must_use]
    pub fn descriptor(&self) -> &'static StageDescriptor {
        self.descriptor
    }

    /// Rendered options, placeholder at index 0.
    #[must_use]
    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    /// Rendered options without the placeholder.
    #[must_use]
    pub fn choices(&self) -> &[FilterOption] {
        self.options.get(1..).unwrap_or_default()
    }

    /// Currently chosen value, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Whether the control accepts input.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Whether `value` is one of the rendered (non-placeholder) choices.
    #[must_use]
    pub fn offers(&self, value: &str) -> bool {
        self.choices().iter().any(|o| o.value == value)
    }

    /// Map what a user typed to an offered value.
    ///
    /// An exact value wins; otherwise a label matching exactly one choice
    /// (ignoring ASCII case) resolves to that choice's value.
    #[must_use]
    pub fn resolve<'a>(&'a self, input: &'a str) -> &'a str {
        if input.is_empty() || self.offers(input) {
            return input;
        }
        let mut matches = self
            .choices()
            .iter()
            .filter(|o| o.label.eq_ignore_ascii_case(input));
        match (matches.next(), matches.next()) {
            (Some(only), None) => only.value.as_str(),
            _ => input,
        }
    }

    /// Back to placeholder-only, disabled, nothing chosen.
    pub(crate) fn reset(&mut self) {
        self.options.clear();
        self.options
            .push(FilterOption::placeholder(self.descriptor.placeholder));
        self.selected = None;
        self.state = StageState::Empty;
    }

    /// Capture a serializable copy of this slot.
    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            stage: self.id(),
            state: self.state,
            enabled: self.is_enabled(),
            selected: self.selected.clone(),
            options: self.options.clone(),
        }
    }
}

// =============================================================================
// STAGE STORE
// =============================================================================

/// All six slots, indexed by `StageId`.
#[derive(Debug, Clone)]
pub struct StageStore {
    slots: [StageSlot; STAGE_COUNT],
}

impl Default for StageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StageStore {
    /// Construct every stage from the registry, all `Empty`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: StageId::ALL.map(|id| StageSlot::new(registry::descriptor(id))),
        }
    }

    /// Get a slot.
    #[must_use]
    pub fn slot(&self, stage: StageId) -> &StageSlot {
        &self.slots[stage.index()]
    }

    pub(crate) fn slot_mut(&mut self, stage: StageId) -> &mut StageSlot {
        &mut self.slots[stage.index()]
    }

    /// All slots in funnel order.
    pub fn iter(&self) -> impl Iterator<Item = &StageSlot> {
        self.slots.iter()
    }

    /// Selected values in funnel order.
    #[must_use]
    pub fn selections(&self) -> Vec<(&'static StageDescriptor, &str)> {
        self.slots
            .iter()
            .filter_map(|s| s.selected().map(|v| (s.descriptor, v)))
            .collect()
    }

    /// Serializable copy of every slot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StageSnapshot> {
        self.slots.iter().map(StageSlot::snapshot).collect()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Point-in-time view of one stage, for output and assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSnapshot {
    pub stage: StageId,
    pub state: StageState,
    pub enabled: bool,
    pub selected: Option<String>,
    pub options: Vec<FilterOption>,
}

// =============================================================================
// TESTS
// =============================================================================
