//! Host-side scenario harness for whole boot cycles.
//!
//! Owns one double per peripheral, wires them into a [`Device`] for each
//! boot, and keeps them afterwards so tests can inspect what happened.

mod file_state;

pub use file_state::FileStateStore;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use embedded_graphics::pixelcolor::BinaryColor;
use inkframe_core::mock::{
    Journal, MemoryStateStore, MockClock, MockHttp, MockPanel, MockPower, MockProbe, MockRadio,
    MockStorage, MockTimeSource, RecordingIndicators, ScriptedButtons, VirtualDelay,
};
use inkframe_core::network::Radio;
use inkframe_core::state::encode;
use inkframe_core::{
    AppId, ButtonSet, CycleConfig, CycleEnd, Device, FrameBuffer, LifecycleOrchestrator,
    PowerSource, Registry, APPS, DISPLAY_HEIGHT, DISPLAY_WIDTH,
};
use png::{BitDepth, ColorType, Encoder};

/// Secrets file a healthy card carries.
pub const SECRETS: &str = r#"WIFI_SSID = "home"
WIFI_PASSWORD = "hunter2"
API_AUTH_HEADER = "X-Api-Key"
API_AUTH_KEY = "k3y"
API_URL = "https://cal.example.com"
"#;

/// Two events, the first one today (see [`today`]).
pub const EVENTS: &str = r#"[
    {"dateTime": "14.Mar.18:00", "summary": "Dentist"},
    {"dateTime": "16.Mar", "summary": "Hike with Sam"}
]"#;

pub const CALENDAR_URL: &str = "https://cal.example.com/calendars/Personal?num-events=5";

/// Wall-clock time the time source reports.
pub fn today() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap_or_default()
}

fn power_on_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Every double of one device. Fields are public for scenario setup and
/// assertions.
pub struct ScenarioHarness {
    pub journal: Journal,
    pub buttons: ScriptedButtons,
    pub leds: RecordingIndicators,
    pub panel: MockPanel,
    pub storage: MockStorage,
    pub state: MemoryStateStore,
    pub radio: MockRadio,
    pub probe: MockProbe,
    pub http: MockHttp,
    pub time_source: MockTimeSource,
    pub clock: MockClock,
    pub power: MockPower,
    pub delay: VirtualDelay,
    pub config: CycleConfig,
    registry: &'static Registry,
    boots: usize,
}

impl ScenarioHarness {
    /// A healthy battery-powered device with nothing selected yet: the card
    /// holds valid secrets, the access point answers on the second poll, and
    /// the calendar API returns [`EVENTS`].
    pub fn new() -> Self {
        let journal = Journal::new();
        let mut storage = MockStorage::new().with_journal(&journal);
        storage.add_file("/sdcard/secrets.py", SECRETS);
        Self {
            buttons: ScriptedButtons::idle(),
            leds: RecordingIndicators::new(),
            panel: MockPanel::new().with_journal(&journal),
            storage,
            state: MemoryStateStore::new().with_journal(&journal),
            radio: MockRadio::joins_after(2).with_journal(&journal),
            probe: MockProbe::reachable(),
            http: MockHttp::ok(EVENTS).with_journal(&journal),
            time_source: MockTimeSource::new(Ok(today())).with_journal(&journal),
            clock: MockClock::new(power_on_clock()),
            power: MockPower::new(PowerSource::Battery).with_journal(&journal),
            delay: VirtualDelay::new(),
            config: CycleConfig::DEFAULT,
            registry: &APPS,
            boots: 0,
            journal,
        }
    }

    /// Same device, but with `id` already saved.
    pub fn with_selection(mut self, id: &str) -> Self {
        if let Some(id) = AppId::parse(id) {
            self.state = MemoryStateStore::with_contents(Some(encode(&id).as_str())).with_journal(&self.journal);
        }
        self
    }

    pub fn on_usb(mut self) -> Self {
        self.power = MockPower::new(PowerSource::Usb).with_journal(&self.journal);
        self
    }

    pub fn with_registry(mut self, registry: &'static Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Script the buttons for the next boot. The first snapshot is what is
    /// held at power-on.
    pub fn script_buttons(&mut self, script: &[ButtonSet]) {
        self.buttons = ScriptedButtons::new(script);
    }

    /// Run one boot cycle to its end.
    pub fn boot(&mut self) -> CycleEnd {
        self.boots += 1;
        self.journal.record(format!("boot {}", self.boots));
        let device = Device {
            buttons: &mut self.buttons,
            leds: &mut self.leds,
            panel: &mut self.panel,
            storage: &mut self.storage,
            state: &mut self.state,
            radio: &mut self.radio,
            probe: &mut self.probe,
            http: &mut self.http,
            time_source: &mut self.time_source,
            clock: &mut self.clock,
            power: &mut self.power,
            delay: &mut self.delay,
        };
        let end = LifecycleOrchestrator::new(device, self.registry, self.config).run_cycle();
        log::info!("boot {} ended: {}", self.boots, end);
        end
    }

    /// What a reset wipes: LED latches, button state, the clock, the timer.
    /// The card, the saved selection and the e-paper image survive.
    pub fn restart(&mut self) {
        self.journal.record("restart");
        self.buttons = ScriptedButtons::idle();
        self.leds = RecordingIndicators::new();
        self.clock = MockClock::new(power_on_clock());
        self.delay = VirtualDelay::new();
    }

    pub fn radio_is_active(&self) -> bool {
        self.radio.is_active()
    }

    pub fn boots(&self) -> usize {
        self.boots
    }

    /// The image currently on the panel.
    pub fn screen(&self) -> Option<&FrameBuffer> {
        self.panel.last_frame()
    }

    /// Save the panel image to a PNG (white = Off, black = On).
    pub fn save_screenshot_png(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let frame = self.screen().ok_or("nothing was shown")?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let mut data = Vec::with_capacity((DISPLAY_WIDTH * DISPLAY_HEIGHT) as usize);
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                data.push(match frame.pixel(x, y) {
                    BinaryColor::On => 0u8,
                    BinaryColor::Off => 255u8,
                });
            }
        }

        let file = File::create(path).map_err(|e| e.to_string())?;
        let writer = BufWriter::new(file);
        let mut encoder = Encoder::new(writer, DISPLAY_WIDTH, DISPLAY_HEIGHT);
        encoder.set_color(ColorType::Grayscale);
        encoder.set_depth(BitDepth::Eight);
        let mut png_writer = encoder.write_header().map_err(|e| e.to_string())?;
        png_writer
            .write_image_data(&data)
            .map_err(|e| e.to_string())
    }
}

impl Default for ScenarioHarness {
    fn default() -> Self {
        Self::new()
    }
}
