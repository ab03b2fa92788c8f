//! The orchestrator's side of the app contract, checked with a spy app.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDateTime;
use inkframe_core::app::{AppEntry, DrawError, InkApp, UpdateError};
use inkframe_core::http::HttpClient;
use inkframe_core::input::Button;
use inkframe_core::secrets::ApiConfig;
use inkframe_core::{CycleEnd, CycleError, FrameBuffer, Registry};
use inkframe_scenario_harness::ScenarioHarness;

static FAILING_DRAWS: AtomicUsize = AtomicUsize::new(0);
static BUILT_WITH_URL: std::sync::Mutex<String> = std::sync::Mutex::new(String::new());

/// Fails every update; counts draws that should never happen.
struct FailingApp;

impl InkApp for FailingApp {
    fn update(&mut self, _http: &mut dyn HttpClient) -> Result<(), UpdateError> {
        Err(UpdateError::Status(502))
    }

    fn draw(&self, _frame: &mut FrameBuffer, _now: NaiveDateTime) -> Result<(), DrawError> {
        FAILING_DRAWS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(60)
    }
}

fn build_failing(api: &ApiConfig) -> Box<dyn InkApp> {
    if let Ok(mut url) = BUILT_WITH_URL.lock() {
        *url = api.base_url.clone();
    }
    Box::new(FailingApp)
}

/// Updates fine but cannot render.
struct BrokenRenderer;

impl InkApp for BrokenRenderer {
    fn update(&mut self, _http: &mut dyn HttpClient) -> Result<(), UpdateError> {
        Ok(())
    }

    fn draw(&self, _frame: &mut FrameBuffer, _now: NaiveDateTime) -> Result<(), DrawError> {
        Err(DrawError::Render("font missing".into()))
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(60)
    }
}

fn build_broken(_api: &ApiConfig) -> Box<dyn InkApp> {
    Box::new(BrokenRenderer)
}

static SPY_APPS: Registry = Registry::new(&[
    AppEntry {
        id: "failing",
        label: "FAILING",
        button: Button::B,
        build: build_failing,
    },
    AppEntry {
        id: "broken",
        label: "BROKEN",
        button: Button::C,
        build: build_broken,
    },
]);

#[test]
fn failed_update_never_draws() {
    let mut harness = ScenarioHarness::new()
        .with_registry(&SPY_APPS)
        .with_selection("failing");

    let end = harness.boot();

    assert_eq!(end, CycleEnd::Failed(CycleError::Update(UpdateError::Status(502))));
    assert_eq!(FAILING_DRAWS.load(Ordering::SeqCst), 0);
    assert_eq!(
        BUILT_WITH_URL.lock().map(|u| u.clone()).unwrap_or_default(),
        "https://cal.example.com"
    );
}

#[test]
fn render_failure_is_fatal() {
    let mut harness = ScenarioHarness::new()
        .with_registry(&SPY_APPS)
        .with_selection("broken");

    let end = harness.boot();

    assert!(matches!(end, CycleEnd::Failed(CycleError::Draw(DrawError::Render(_)))));
    assert!(!harness.power.powered_down());
    assert!(!harness.radio_is_active());
}

#[test]
fn app_missing_from_registry_returns_to_launcher() {
    let mut harness = ScenarioHarness::new()
        .with_registry(&SPY_APPS)
        .with_selection("calendar");
    harness.script_buttons(&[
        inkframe_core::ButtonSet::EMPTY,
        inkframe_core::ButtonSet::of(&[Button::A]),
        inkframe_core::ButtonSet::of(&[Button::C]),
    ]);

    let end = harness.boot();

    assert_eq!(
        end,
        CycleEnd::SelectionSaved(inkframe_core::AppId::parse("broken").unwrap())
    );
}
