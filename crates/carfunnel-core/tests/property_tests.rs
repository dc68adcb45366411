//! # Property-Based Tests
//!
//! Render and cascade invariants under arbitrary inputs.

use carfunnel_core::{
    CascadeController, FilterOption, SequenceLedger, StageId, StageSlot, StageState, registry,
    render,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_option() -> impl Strategy<Value = FilterOption> {
    ("[a-z0-9]{1,8}", "[A-Za-z0-9 ]{0,12}").prop_map(|(v, l)| FilterOption::new(v, l))
}

fn arb_stage() -> impl Strategy<Value = StageId> {
    (0usize..6).prop_map(|i| StageId::ALL[i])
}

proptest! {
    /// Placeholder at index 0, followed by the supplied options verbatim.
    #[test]
    fn render_is_placeholder_plus_input(
        stage in arb_stage(),
        options in vec(arb_option(), 0..20)
    ) {
        let mut slot = StageSlot::new(registry::descriptor(stage));
        let state = render::render(&mut slot, options.clone());

        prop_assert_eq!(slot.options().len(), options.len() + 1);
        prop_assert!(slot.options()[0].is_placeholder());
        prop_assert_eq!(&slot.options()[0].label, registry::descriptor(stage).placeholder);
        prop_assert_eq!(slot.choices(), &options[..]);
        prop_assert_eq!(state.is_enabled(), !options.is_empty());
    }

    /// Sequences only grow, and only the newest request is current.
    #[test]
    fn ledger_only_latest_is_current(stages in vec(arb_stage(), 1..40)) {
        let mut ledger = SequenceLedger::new();
        let mut issued = Vec::new();

        for stage in stages {
            let before = ledger.latest(stage);
            let request = ledger.issue(stage, None);
            prop_assert!(request.sequence > before);
            issued.push(request);
        }

        for request in &issued {
            let newest = issued
                .iter()
                .filter(|r| r.stage == request.stage)
                .map(|r| r.sequence)
                .max();
            prop_assert_eq!(ledger.is_current(request), newest == Some(request.sequence));
        }
    }

    /// After any selection at stage i, every later stage is Empty,
    /// disabled and placeholder-only.
    #[test]
    fn selection_resets_downstream(
        fill in vec(vec(arb_option(), 1..5), 6),
        picks in vec((0usize..6, 0usize..5), 1..12)
    ) {
        let mut controller = CascadeController::new(());
        for (stage, options) in StageId::ALL.into_iter().zip(fill.iter()) {
            controller.populate(stage, options.clone());
        }

        for (index, choice) in picks {
            let stage = StageId::ALL[index];
            let slot = controller.slot(stage);
            if !slot.is_enabled() {
                continue;
            }
            let value = slot
                .choices()
                .get(choice)
                .map(|o| o.value.clone())
                .unwrap_or_default();

            let Ok(cascade) = controller.select(stage, &value) else {
                continue;
            };
            if cascade.is_noop() {
                continue;
            }
            prop_assert_eq!(cascade.reset, stage.downstream().collect::<Vec<_>>());

            for later in stage.downstream() {
                let slot = controller.slot(later);
                prop_assert_eq!(slot.state(), StageState::Empty);
                prop_assert!(!slot.is_enabled());
                prop_assert_eq!(slot.options().len(), 1);
                prop_assert_eq!(slot.selected(), None);
            }
        }
    }
}
