//! # Option Renderer
//!
//! Replaces a stage's option set, placeholder first, and publishes the
//! result through the [`StageView`] output port.
//!
//! - The backend's ordering is authoritative: no sorting, no deduplication
//! - A stage with no options beyond the placeholder is disabled
//! - A previous selection survives only if it is still offered

use crate::store::StageSlot;
use crate::{FilterOption, StageId, StageState};

// =============================================================================
// OUTPUT PORT
// =============================================================================

/// Where rendered stages go: a DOM binding, a terminal, a recorder.
pub trait StageView {
    /// Show `options` for `stage`. `options[0]` is always the placeholder.
    fn render(&mut self, stage: StageId, options: &[FilterOption], enabled: bool);
}

/// Headless view.
impl StageView for () {
    fn render(&mut self, _stage: StageId, _options: &[FilterOption], _enabled: bool) {}
}

/// One call to [`StageView::render`], as captured by a recording view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEvent {
    pub stage: StageId,
    pub options: Vec<FilterOption>,
    pub enabled: bool,
}

/// Records every render, in order.
impl StageView for Vec<RenderEvent> {
    fn render(&mut self, stage: StageId, options: &[FilterOption], enabled: bool) {
        self.push(RenderEvent {
            stage,
            options: options.to_vec(),
            enabled,
        });
    }
}

// =============================================================================
// RENDER
// =============================================================================

/// Replace `slot`'s full option set with the placeholder followed by `options`.
///
/// Returns the slot's resulting state: `Empty` when nothing beyond the
/// placeholder was supplied, `Selected` when the prior selection is still
/// offered, `Populated` otherwise.
pub fn render(slot: &mut StageSlot, options: Vec<FilterOption>) -> StageState {
    let mut rendered = Vec::with_capacity(options.len().saturating_add(1));
    rendered.push(FilterOption::placeholder(slot.descriptor.placeholder));
    rendered.extend(options);
    slot.options = rendered;

    let still_offered = slot
        .selected
        .as_deref()
        .is_some_and(|v| slot.choices().iter().any(|o| o.value == v));
    if !still_offered {
        slot.selected = None;
    }

    slot.state = if slot.choices().is_empty() {
        StageState::Empty
    } else if slot.selected.is_some() {
        StageState::Selected
    } else {
        StageState::Populated
    };
    slot.state
}

// =============================================================================
// TESTS
// =============================================================================
