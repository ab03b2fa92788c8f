mod clock;
mod http_client;
mod input;
mod leds;
mod panel;
mod power;
mod runtime_diagnostics;
mod sdcard;
mod state_store;
mod wifi;

use anyhow::Context;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::{
    delay::FreeRtos,
    gpio::{AnyIOPin, IOPin, OutputPin, PinDriver, Pull},
    ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver},
    peripherals::Peripherals,
    prelude::*,
    spi::{config::Config, SpiDeviceDriver, SpiDriver, SpiDriverConfig},
};
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use inkframe_core::{Button, CycleConfig, Device, Led, LifecycleOrchestrator, APPS};

use clock::{EspSystemClock, SntpTimeSource};
use http_client::{EspFetcher, HttpProbe};
use input::FrontButtons;
use leds::LedBank;
use panel::EpaperPanel;
use power::BoardPower;
use runtime_diagnostics::{log_heap, log_wakeup_cause};
use sdcard::SdCard;
use state_store::NvsStateStore;
use wifi::StationRadio;

/// Answers quickly over HTTP without credentials.
const PROBE_URL: &str = "http://connectivitycheck.gstatic.com/generate_204";
const SD_CS_GPIO: i32 = 42;
/// GPIO 1, 2, 4, 5 and 6: buttons A to E.
const WAKE_BUTTON_MASK: u64 = (1 << 1) | (1 << 2) | (1 << 4) | (1 << 5) | (1 << 6);
/// Pause before restarting after a setup failure, so a broken board does
/// not spin.
const SETUP_FAILURE_BACKOFF_MS: u32 = 60_000;

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log_heap("startup");
    log_wakeup_cause();

    if let Err(err) = run() {
        log::error!("setup failed: {:?}", err);
        FreeRtos::delay_ms(SETUP_FAILURE_BACKOFF_MS);
    }

    log_heap("restart");
    esp_idf_svc::hal::reset::restart();
}

fn run() -> anyhow::Result<()> {
    let peripherals = Peripherals::take().context("peripherals")?;
    let pins = peripherals.pins;
    let sys_loop = EspSystemEventLoop::take().context("event loop")?;
    let nvs = EspDefaultNvsPartition::take().context("nvs partition")?;

    let panel_bus = SpiDriver::new(
        peripherals.spi2,
        pins.gpio12,
        pins.gpio11,
        None::<AnyIOPin>,
        &SpiDriverConfig::default(),
    )?;
    let panel_spi = SpiDeviceDriver::new(
        panel_bus,
        Some(pins.gpio10),
        &Config::default().baudrate(4.MHz().into()),
    )?;
    let mut panel = EpaperPanel::new(
        panel_spi,
        PinDriver::input(pins.gpio7.downgrade())?,
        PinDriver::output(pins.gpio9.downgrade_output())?,
        PinDriver::output(pins.gpio8.downgrade_output())?,
    )
    .context("panel init")?;

    let sd_bus = SpiDriver::new(
        peripherals.spi3,
        pins.gpio39,
        pins.gpio40,
        Some(pins.gpio41),
        &SpiDriverConfig::default(),
    )?;
    let mut storage = SdCard::new(sd_bus, SD_CS_GPIO);

    let mut buttons = FrontButtons::new([
        pins.gpio1.downgrade(),
        pins.gpio2.downgrade(),
        pins.gpio4.downgrade(),
        pins.gpio5.downgrade(),
        pins.gpio6.downgrade(),
    ])?;

    let ledc = peripherals.ledc;
    let led_timer = LedcTimerDriver::new(
        ledc.timer0,
        &TimerConfig::default().frequency(5.kHz().into()),
    )?;
    let mut leds = LedBank::new(vec![
        (Led::Button(Button::A), LedcDriver::new(ledc.channel0, &led_timer, pins.gpio13)?),
        (Led::Button(Button::B), LedcDriver::new(ledc.channel1, &led_timer, pins.gpio14)?),
        (Led::Button(Button::C), LedcDriver::new(ledc.channel2, &led_timer, pins.gpio15)?),
        (Led::Button(Button::D), LedcDriver::new(ledc.channel3, &led_timer, pins.gpio16)?),
        (Led::Button(Button::E), LedcDriver::new(ledc.channel4, &led_timer, pins.gpio17)?),
        (Led::Busy, LedcDriver::new(ledc.channel5, &led_timer, pins.gpio18)?),
        (Led::Network, LedcDriver::new(ledc.channel6, &led_timer, pins.gpio21)?),
    ]);

    let mut vbus = PinDriver::input(pins.gpio47.downgrade())?;
    vbus.set_pull(Pull::Down)?;
    let mut power = BoardPower::new(vbus, WAKE_BUTTON_MASK);

    let mut state = NvsStateStore::new(nvs.clone())?;
    let mut radio = StationRadio::new(peripherals.modem, sys_loop, nvs);
    let mut probe = HttpProbe::new(PROBE_URL);
    let mut http = EspFetcher;
    let mut time_source = SntpTimeSource;
    let mut clock = EspSystemClock;
    let mut delay = FreeRtos;

    log_heap("peripherals ready");

    let device = Device {
        buttons: &mut buttons,
        leds: &mut leds,
        panel: &mut panel,
        storage: &mut storage,
        state: &mut state,
        radio: &mut radio,
        probe: &mut probe,
        http: &mut http,
        time_source: &mut time_source,
        clock: &mut clock,
        power: &mut power,
        delay: &mut delay,
    };
    let end = LifecycleOrchestrator::new(device, &APPS, CycleConfig::DEFAULT).run_cycle();
    log::info!("cycle ended: {}", end);
    Ok(())
}
