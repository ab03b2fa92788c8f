//! Successful refreshes and how the device goes to sleep afterwards.

use std::time::Duration;

use embedded_graphics::pixelcolor::BinaryColor;
use inkframe_core::{CycleEnd, Led, LedLevel, SleepStrategy};
use inkframe_scenario_harness::{today, ScenarioHarness, CALENDAR_URL};

const CALENDAR_REFRESH: Duration = Duration::from_secs(300 * 60);

#[test]
fn battery_refresh_ends_in_deep_sleep() {
    let mut harness = ScenarioHarness::new().with_selection("calendar");

    let end = harness.boot();

    match end {
        CycleEnd::Slept(report) => {
            assert_eq!(report.strategy, SleepStrategy::Deep);
            assert_eq!(report.interval, CALENDAR_REFRESH);
        }
        other => panic!("expected deep sleep, got {:?}", other),
    }
    assert_eq!(harness.power.armed(), Some(CALENDAR_REFRESH));
    assert!(harness.power.powered_down());
    assert_eq!(harness.power.light_sleeps(), 0);
    assert!(!harness.radio_is_active());
    assert!(harness.leds.all_off());
    assert_eq!(harness.clock.sets(), 1);
}

#[test]
fn cycle_steps_run_in_order() {
    let mut harness = ScenarioHarness::new().with_selection("calendar");
    harness.boot();

    let journal = &harness.journal;
    let steps = [
        "storage:mount /sdcard".to_string(),
        "radio:activate".to_string(),
        "radio:join home".to_string(),
        "time:read".to_string(),
        format!("http:get {}", CALENDAR_URL),
        "panel:show".to_string(),
        "radio:deactivate".to_string(),
        "power:arm 18000s".to_string(),
        "power:down".to_string(),
    ];
    for pair in steps.windows(2) {
        assert!(journal.before(&pair[0], &pair[1]), "{} not before {}", pair[0], pair[1]);
    }
}

#[test]
fn usb_refresh_flashes_and_light_sleeps() {
    let mut harness = ScenarioHarness::new().with_selection("calendar").on_usb();

    let end = harness.boot();

    assert!(matches!(
        end,
        CycleEnd::Slept(report) if report.strategy == SleepStrategy::Interruptible
    ));
    assert_eq!(harness.power.light_sleeps(), 1);
    assert!(!harness.power.powered_down());
    assert!(!harness.radio_is_active());
    assert!(harness.journal.before("radio:deactivate", "power:light"));
    assert!(harness.leds.times_lit(Led::Button(inkframe_core::Button::C)) >= 10);
    assert!(harness.leds.all_off());
}

#[test]
fn network_led_glows_while_joining() {
    let mut harness = ScenarioHarness::new().with_selection("calendar");
    harness.boot();
    assert!(harness.leds.was_set(Led::Network, LedLevel::Glow));
    assert_eq!(harness.leds.level(Led::Network), LedLevel::Off);
}

#[test]
fn screen_shows_todays_event_highlighted() {
    let mut harness = ScenarioHarness::new().with_selection("calendar");
    harness.boot();

    let screen = harness.screen().expect("calendar drawn");
    // Title band along the top, today's row inverted near the right edge.
    assert_eq!(screen.pixel(1, 1), BinaryColor::On);
    assert_eq!(screen.pixel(790, 145), BinaryColor::On);
    assert_eq!(screen.pixel(790, 215), BinaryColor::Off);
    assert_eq!(harness.clock.sets(), 1);
    assert_eq!(today().format("%d.%b").to_string(), "14.Mar");
}

#[test]
fn empty_calendar_still_refreshes() {
    let mut harness = ScenarioHarness::new().with_selection("calendar");
    harness.http = inkframe_core::mock::MockHttp::ok("[]");

    assert!(matches!(harness.boot(), CycleEnd::Slept(_)));
    assert!(!harness.screen().expect("placeholder drawn").is_blank());
}
