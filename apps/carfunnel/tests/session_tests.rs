//! Integration tests for the funnel session.
//!
//! Lookups go to an in-process fake backend whose answers can be held back
//! per request, so completion order is under the test's control.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use carfunnel::cli::{BrowseCommand, run_browse_command};
use carfunnel::{Applied, Config, FunnelSession, Lookup};
use carfunnel_core::{
    FilterOption, FunnelError, LookupError, RenderEvent, StageDescriptor, StageId, StageState,
    StageView,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// =============================================================================
// FAKE BACKEND
// =============================================================================

type Key = (StageId, Option<String>);

#[derive(Default)]
struct Backend {
    answers: Mutex<HashMap<Key, Result<Vec<FilterOption>, LookupError>>>,
    gates: Mutex<HashMap<Key, Arc<Notify>>>,
    calls: Mutex<Vec<Key>>,
}

/// Lookup handle the session owns; the test keeps the `Arc<Backend>`.
#[derive(Clone)]
struct FakeLookup(Arc<Backend>);

impl Lookup for FakeLookup {
    async fn fetch(
        &self,
        stage: &'static StageDescriptor,
        param: Option<String>,
    ) -> Result<Vec<FilterOption>, LookupError> {
        let key = (stage.id, param);
        self.0.calls.lock().unwrap().push(key.clone());
        let gate = self.0.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.0
            .answers
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Catalog lookup that blows up on one stage.
struct PanicsOn(StageId, FakeLookup);

impl Lookup for PanicsOn {
    async fn fetch(
        &self,
        stage: &'static StageDescriptor,
        param: Option<String>,
    ) -> Result<Vec<FilterOption>, LookupError> {
        if stage.id == self.0 {
            panic!("lookup for {} exploded", stage.id);
        }
        self.1.fetch(stage, param).await
    }
}

fn opts(values: &[&str]) -> Vec<FilterOption> {
    values.iter().map(|v| FilterOption::new(*v, *v)).collect()
}

fn key(stage: StageId, param: Option<&str>) -> Key {
    (stage, param.map(str::to_string))
}

impl Backend {
    /// A small catalog covering every stage.
    fn catalog() -> Arc<Self> {
        let backend = Arc::new(Self::default());
        backend.answer(StageId::Make, None, Ok(opts(&["honda", "toyota"])));
        backend.answer(StageId::Model, Some("honda"), Ok(opts(&["civic", "jazz"])));
        backend.answer(StageId::Model, Some("toyota"), Ok(opts(&["corolla", "yaris"])));
        backend.answer(StageId::Year, Some("civic"), Ok(opts(&["2022", "2023"])));
        backend.answer(StageId::Year, Some("corolla"), Ok(opts(&["2019"])));
        backend.answer(StageId::CarType, Some("2022"), Ok(opts(&["Hatchback", "Saloon"])));
        backend.answer(StageId::FuelType, Some("Hatchback"), Ok(opts(&["Petrol"])));
        backend.answer(StageId::Location, Some("Petrol"), Ok(opts(&["Dublin", "Cork"])));
        backend
    }

    fn answer(
        &self,
        stage: StageId,
        param: Option<&str>,
        answer: Result<Vec<FilterOption>, LookupError>,
    ) {
        self.answers.lock().unwrap().insert(key(stage, param), answer);
    }

    /// Hold back the answer for this request until the returned gate opens.
    fn gate(&self, stage: StageId, param: Option<&str>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(key(stage, param), Arc::clone(&gate));
        gate
    }

    fn calls(&self) -> Vec<Key> {
        self.calls.lock().unwrap().clone()
    }
}

async fn open(backend: &Arc<Backend>) -> FunnelSession<FakeLookup, Vec<RenderEvent>> {
    let mut session =
        FunnelSession::open(FakeLookup(Arc::clone(backend)), Vec::<RenderEvent>::new());
    session.settle().await;
    session
}

async fn apply_next<V: StageView>(session: &mut FunnelSession<FakeLookup, V>) -> Applied {
    let completion = session.next_completion().await.unwrap();
    session.apply(completion)
}

fn state<V: StageView>(session: &FunnelSession<FakeLookup, V>, stage: StageId) -> StageState {
    session.controller().slot(stage).state()
}

fn values<V: StageView>(session: &FunnelSession<FakeLookup, V>, stage: StageId) -> Vec<String> {
    session
        .controller()
        .slot(stage)
        .options()
        .iter()
        .map(|o| o.value.clone())
        .collect()
}

// =============================================================================
// CASCADE
// =============================================================================

#[tokio::test]
async fn open_loads_only_the_first_stage() {
    let backend = Backend::catalog();
    let session = open(&backend).await;

    assert_eq!(backend.calls(), vec![key(StageId::Make, None)]);
    assert_eq!(state(&session, StageId::Make), StageState::Populated);
    assert_eq!(values(&session, StageId::Make), vec!["", "honda", "toyota"]);
    for stage in StageId::Make.downstream() {
        assert_eq!(state(&session, stage), StageState::Empty);
        assert!(!session.controller().slot(stage).is_enabled());
    }
}

#[tokio::test]
async fn selecting_a_make_populates_models() {
    let backend = Backend::catalog();
    let mut session = open(&backend).await;

    session.select(StageId::Make, "honda").unwrap();
    assert_eq!(state(&session, StageId::Model), StageState::Loading);

    let applied = session.settle().await;
    assert_eq!(
        applied,
        vec![Applied::Rendered {
            stage: StageId::Model,
            state: StageState::Populated
        }]
    );
    assert_eq!(values(&session, StageId::Model), vec!["", "civic", "jazz"]);
    assert_eq!(backend.calls().last(), Some(&key(StageId::Model, Some("honda"))));

    let last = session.controller().view().last().unwrap();
    assert_eq!(last.stage, StageId::Model);
    assert!(last.enabled);
    assert_eq!(last.options[0].label, "Select Model");
}

#[tokio::test]
async fn changing_make_resets_everything_downstream() {
    let backend = Backend::catalog();
    let mut session = open(&backend).await;
    session.select(StageId::Make, "honda").unwrap();
    session.settle().await;
    session.select(StageId::Model, "civic").unwrap();
    session.settle().await;
    session.select(StageId::Year, "2022").unwrap();
    session.settle().await;
    assert_eq!(state(&session, StageId::CarType), StageState::Populated);

    let cascade = session.select(StageId::Make, "toyota").unwrap();
    assert_eq!(cascade.reset.len(), 5);

    // Nothing from the honda branch survives while the new lookup is pending.
    assert_eq!(state(&session, StageId::Model), StageState::Loading);
    for stage in StageId::Model.downstream() {
        assert_eq!(state(&session, stage), StageState::Empty);
        assert_eq!(values(&session, stage), vec![""]);
    }

    session.settle().await;
    assert_eq!(values(&session, StageId::Model), vec!["", "corolla", "yaris"]);
}

#[tokio::test]
async fn full_walk_reaches_location() {
    let backend = Backend::catalog();
    let mut session = open(&backend).await;

    for (stage, value) in StageId::ALL.into_iter().zip([
        "honda",
        "civic",
        "2022",
        "Hatchback",
        "Petrol",
        "Dublin",
    ]) {
        session.select(stage, value).unwrap();
        session.settle().await;
    }

    // Choosing a location issues no further lookup.
    assert_eq!(backend.calls().len(), 6);
    assert_eq!(session.in_flight(), 0);
    let picked: Vec<_> = session
        .selections()
        .into_iter()
        .map(|(d, v)| (d.id, v.to_string()))
        .collect();
    assert_eq!(picked.len(), 6);
    assert_eq!(picked[5], (StageId::Location, "Dublin".to_string()));
}

#[tokio::test]
async fn reselecting_same_value_dispatches_nothing() {
    let backend = Backend::catalog();
    let mut session = open(&backend).await;
    session.select(StageId::Make, "honda").unwrap();
    session.settle().await;

    let cascade = session.select(StageId::Make, "honda").unwrap();
    assert!(cascade.is_noop());
    assert_eq!(session.in_flight(), 0);
    assert_eq!(backend.calls().len(), 2);
    assert_eq!(state(&session, StageId::Model), StageState::Populated);
}

// =============================================================================
// STALENESS
// =============================================================================

#[tokio::test]
async fn late_answer_for_superseded_make_is_discarded() {
    let backend = Backend::catalog();
    let honda = backend.gate(StageId::Model, Some("honda"));
    let toyota = backend.gate(StageId::Model, Some("toyota"));
    let mut session = open(&backend).await;

    session.select(StageId::Make, "honda").unwrap();
    session.select(StageId::Make, "toyota").unwrap();
    assert_eq!(session.in_flight(), 2);

    toyota.notify_one();
    assert_eq!(
        apply_next(&mut session).await,
        Applied::Rendered {
            stage: StageId::Model,
            state: StageState::Populated
        }
    );

    honda.notify_one();
    assert!(matches!(
        apply_next(&mut session).await,
        Applied::Discarded {
            stage: StageId::Model,
            ..
        }
    ));
    assert_eq!(values(&session, StageId::Model), vec!["", "corolla", "yaris"]);
}

#[tokio::test]
async fn stale_answer_arriving_first_is_discarded() {
    let backend = Backend::catalog();
    let honda = backend.gate(StageId::Model, Some("honda"));
    let toyota = backend.gate(StageId::Model, Some("toyota"));
    let mut session = open(&backend).await;

    session.select(StageId::Make, "honda").unwrap();
    session.select(StageId::Make, "toyota").unwrap();

    honda.notify_one();
    assert!(matches!(
        apply_next(&mut session).await,
        Applied::Discarded { .. }
    ));
    // Still waiting on the current request.
    assert_eq!(state(&session, StageId::Model), StageState::Loading);

    toyota.notify_one();
    apply_next(&mut session).await;
    assert_eq!(values(&session, StageId::Model), vec!["", "corolla", "yaris"]);
}

#[tokio::test]
async fn clearing_parent_orphans_in_flight_lookup() {
    let backend = Backend::catalog();
    let gate = backend.gate(StageId::Model, Some("honda"));
    let mut session = open(&backend).await;

    session.select(StageId::Make, "honda").unwrap();
    let cascade = session.select(StageId::Make, "").unwrap();
    assert!(cascade.next.is_none());
    assert_eq!(state(&session, StageId::Make), StageState::Populated);

    gate.notify_one();
    assert!(matches!(
        apply_next(&mut session).await,
        Applied::Discarded { .. }
    ));
    assert_eq!(state(&session, StageId::Model), StageState::Empty);
    assert_eq!(session.in_flight(), 0);
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn failed_lookup_leaves_stage_empty_and_disabled() {
    let backend = Backend::catalog();
    backend.answer(StageId::Model, Some("honda"), Err(LookupError::Status(500)));
    let mut session = open(&backend).await;

    session.select(StageId::Make, "honda").unwrap();
    let applied = session.settle().await;

    assert_eq!(applied, vec![Applied::Failed { stage: StageId::Model }]);
    assert_eq!(state(&session, StageId::Model), StageState::Empty);
    assert_eq!(values(&session, StageId::Model), vec![""]);
    assert!(matches!(
        session.select(StageId::Model, "civic"),
        Err(FunnelError::StageDisabled(StageId::Model))
    ));
}

#[tokio::test]
async fn malformed_or_empty_body_means_no_matches() {
    let backend = Backend::catalog();
    backend.answer(
        StageId::Model,
        Some("toyota"),
        Err(LookupError::Malformed("expected a sequence".into())),
    );
    let mut session = open(&backend).await;

    session.select(StageId::Make, "toyota").unwrap();
    assert_eq!(
        session.settle().await,
        vec![Applied::Rendered {
            stage: StageId::Model,
            state: StageState::Empty
        }]
    );

    session.select(StageId::Make, "honda").unwrap();
    session.settle().await;
    session.select(StageId::Model, "jazz").unwrap();
    // No years are known for "jazz": an empty list, not an error.
    assert_eq!(
        session.settle().await,
        vec![Applied::Rendered {
            stage: StageId::Year,
            state: StageState::Empty
        }]
    );
}

#[tokio::test]
async fn dead_lookup_task_still_completes() {
    let backend = Backend::catalog();
    let lookup = PanicsOn(StageId::Model, FakeLookup(Arc::clone(&backend)));
    let mut session = FunnelSession::open(lookup, ());
    session.settle().await;

    session.select(StageId::Make, "honda").unwrap();
    let applied = tokio::time::timeout(Duration::from_secs(3), session.settle())
        .await
        .expect("settle returns after a lookup task panics");

    assert_eq!(applied, vec![Applied::Failed { stage: StageId::Model }]);
    assert_eq!(session.in_flight(), 0);
    assert_eq!(
        session.controller().slot(StageId::Model).state(),
        StageState::Empty
    );
}

#[tokio::test]
async fn reload_retries_a_failed_stage() {
    let backend = Backend::catalog();
    backend.answer(StageId::Make, None, Err(LookupError::Timeout));
    let mut session = open(&backend).await;
    assert_eq!(state(&session, StageId::Make), StageState::Empty);

    backend.answer(StageId::Make, None, Ok(opts(&["honda"])));
    let request = session.reload(StageId::Make).unwrap();
    assert_eq!(request.param, None);
    session.settle().await;

    assert_eq!(values(&session, StageId::Make), vec!["", "honda"]);
}

#[tokio::test]
async fn reload_uses_parent_selection() {
    let backend = Backend::catalog();
    let mut session = open(&backend).await;

    assert!(matches!(
        session.reload(StageId::Model),
        Err(FunnelError::StageDisabled(StageId::Model))
    ));

    session.select(StageId::Make, "honda").unwrap();
    session.settle().await;
    let request = session.reload(StageId::Model).unwrap();
    assert_eq!(request.param.as_deref(), Some("honda"));
    assert!(request.sequence.value() > 1);
    session.settle().await;
    assert_eq!(state(&session, StageId::Model), StageState::Populated);
}

// =============================================================================
// INPUT VALIDATION
// =============================================================================

#[tokio::test]
async fn rejected_input_leaves_state_untouched() {
    let backend = Backend::catalog();
    let mut session = open(&backend).await;
    let before = session.snapshot();

    assert!(matches!(
        session.select(StageId::Make, "ferrari"),
        Err(FunnelError::UnknownOption { .. })
    ));
    assert!(matches!(
        session.select(StageId::Year, "2022"),
        Err(FunnelError::StageDisabled(StageId::Year))
    ));

    assert_eq!(session.snapshot(), before);
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn browse_commands_drive_the_session() {
    let backend = Backend::catalog();
    let mut session = open(&backend).await;
    let config = Config::default();

    run_browse_command(&mut session, BrowseCommand::parse("select 1 honda").unwrap(), &config)
        .unwrap();
    session.settle().await;
    assert_eq!(state(&session, StageId::Model), StageState::Populated);

    run_browse_command(&mut session, BrowseCommand::parse("clear make").unwrap(), &config)
        .unwrap();
    assert_eq!(state(&session, StageId::Make), StageState::Populated);
    assert_eq!(state(&session, StageId::Model), StageState::Empty);

    let result = run_browse_command(
        &mut session,
        BrowseCommand::parse("select model civic").unwrap(),
        &config,
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn browse_select_accepts_the_label_shown() {
    let backend = Arc::new(Backend::default());
    backend.answer(
        StageId::Make,
        None,
        Ok(vec![
            FilterOption::new("honda", "Honda"),
            FilterOption::new("toyota", "Toyota"),
        ]),
    );
    backend.answer(
        StageId::Model,
        Some("honda"),
        Ok(vec![FilterOption::new("civic", "Civic")]),
    );
    let mut session = open(&backend).await;
    let config = Config::default();

    run_browse_command(&mut session, BrowseCommand::parse("select make Honda").unwrap(), &config)
        .unwrap();
    session.settle().await;

    assert_eq!(session.controller().slot(StageId::Make).selected(), Some("honda"));
    assert_eq!(backend.calls().last(), Some(&key(StageId::Model, Some("honda"))));

    // The raw value keeps working too.
    run_browse_command(&mut session, BrowseCommand::parse("select 2 civic").unwrap(), &config)
        .unwrap();
    assert_eq!(state(&session, StageId::Model), StageState::Selected);
}
