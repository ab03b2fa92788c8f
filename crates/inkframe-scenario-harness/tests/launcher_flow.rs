//! Launcher round-trip: pick an app, restart, resume it.

use inkframe_core::input::Button;
use inkframe_core::{AppId, ButtonSet, CycleEnd, Led, LedLevel, PersistedState, SleepStrategy};
use inkframe_scenario_harness::ScenarioHarness;

fn calendar() -> AppId {
    AppId::parse("calendar").unwrap()
}

#[test]
fn first_boot_shows_launcher_and_pick_resumes_after_restart() {
    let mut harness = ScenarioHarness::new();
    harness.script_buttons(&[ButtonSet::EMPTY, ButtonSet::EMPTY, ButtonSet::of(&[Button::A])]);

    let end = harness.boot();
    assert_eq!(end, CycleEnd::SelectionSaved(calendar()));
    assert_eq!(PersistedState::new(&mut harness.state).load(), Some(calendar()));
    assert_eq!(harness.leds.level(Led::Button(Button::A)), LedLevel::On);
    // The launcher does not touch the network or the card.
    assert!(!harness.journal.contains("radio:activate"));
    assert_eq!(harness.storage.mount_calls(), 0);

    harness.restart();
    match harness.boot() {
        CycleEnd::Slept(report) => assert_eq!(report.strategy, SleepStrategy::Deep),
        other => panic!("expected a refresh, got {:?}", other),
    }
    assert_eq!(harness.http.requests().len(), 1);
    assert_eq!(harness.boots(), 2);
}

#[test]
fn press_already_down_when_menu_appears_is_taken() {
    let mut harness = ScenarioHarness::new();
    harness.script_buttons(&[ButtonSet::EMPTY, ButtonSet::of(&[Button::A])]);

    assert_eq!(harness.boot(), CycleEnd::SelectionSaved(calendar()));
    assert_eq!(harness.buttons.reads(), 2);
}

#[test]
fn combo_overrides_saved_selection() {
    let mut harness = ScenarioHarness::new().with_selection("calendar");
    let combo = ButtonSet::of(&[Button::A, Button::E]);
    harness.script_buttons(&[combo, combo, ButtonSet::EMPTY, ButtonSet::of(&[Button::A])]);

    let end = harness.boot();

    assert_eq!(end, CycleEnd::SelectionSaved(calendar()));
    assert!(harness.http.requests().is_empty());
    assert_eq!(harness.panel.refreshes(), 1);
}

#[test]
fn saved_selection_skips_launcher() {
    let mut harness = ScenarioHarness::new().with_selection("calendar");

    let end = harness.boot();

    assert!(matches!(end, CycleEnd::Slept(_)));
    assert_eq!(harness.state.writes(), 0);
    assert_eq!(harness.buttons.reads(), 1);
}

#[test]
fn unknown_saved_app_falls_back_to_launcher() {
    let mut harness = ScenarioHarness::new().with_selection("weather");
    harness.script_buttons(&[ButtonSet::EMPTY, ButtonSet::of(&[Button::A])]);

    let end = harness.boot();

    assert_eq!(end, CycleEnd::SelectionSaved(calendar()));
    assert_eq!(PersistedState::new(&mut harness.state).load(), Some(calendar()));
}

#[test]
fn corrupt_state_falls_back_to_launcher() {
    let mut harness = ScenarioHarness::new();
    harness.state = inkframe_core::mock::MemoryStateStore::with_contents(Some("app=calendar"));
    harness.script_buttons(&[ButtonSet::EMPTY, ButtonSet::of(&[Button::A])]);

    assert_eq!(harness.boot(), CycleEnd::SelectionSaved(calendar()));
}

#[test]
fn failed_save_shows_diagnostic() {
    let mut harness = ScenarioHarness::new();
    harness.state.fail_writes(true);
    harness.script_buttons(&[ButtonSet::EMPTY, ButtonSet::of(&[Button::A])]);

    let end = harness.boot();

    assert!(matches!(end, CycleEnd::Failed(inkframe_core::CycleError::State(_))));
    // Menu, then the diagnostic.
    assert_eq!(harness.panel.refreshes(), 2);
    assert!(harness.leds.all_off());
}
