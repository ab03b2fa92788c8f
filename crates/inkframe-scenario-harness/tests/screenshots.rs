//! Dumps the screens a user can see, for eyeballing layout changes.

use inkframe_core::input::Button;
use inkframe_core::mock::MockRadio;
use inkframe_core::ButtonSet;
use inkframe_scenario_harness::ScenarioHarness;

fn out_dir() -> std::path::PathBuf {
    std::env::temp_dir().join("inkframe-screenshots")
}

#[test]
fn screenshot_launcher_calendar_and_diagnostic() {
    let mut launcher = ScenarioHarness::new();
    launcher.script_buttons(&[ButtonSet::EMPTY, ButtonSet::EMPTY, ButtonSet::of(&[Button::A])]);
    launcher.boot();
    launcher
        .save_screenshot_png(out_dir().join("launcher.png"))
        .expect("launcher screenshot");

    let mut calendar = ScenarioHarness::new().with_selection("calendar");
    calendar.boot();
    calendar
        .save_screenshot_png(out_dir().join("calendar.png"))
        .expect("calendar screenshot");

    let mut failed = ScenarioHarness::new().with_selection("calendar");
    failed.radio = MockRadio::never_joins();
    failed.boot();
    let path = out_dir().join("diagnostic.png");
    failed.save_screenshot_png(&path).expect("diagnostic screenshot");
    assert!(std::fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false));
}

#[test]
fn screenshot_without_frame_is_an_error() {
    let harness = ScenarioHarness::new();
    assert!(harness
        .save_screenshot_png(out_dir().join("never.png"))
        .is_err());
}
