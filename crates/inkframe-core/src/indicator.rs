//! Indicator LEDs and best-effort progress feedback.

use alloc::string::String;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use thiserror::Error;

use crate::config::millis;
use crate::input::Button;

/// One indicator LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    /// LED above a front-panel button.
    Button(Button),
    /// Activity LED, lit while the device is working.
    Busy,
    /// Network LED.
    Network,
}

impl Led {
    pub const ALL: [Led; 7] = [
        Led::Button(Button::A),
        Led::Button(Button::B),
        Led::Button(Button::C),
        Led::Button(Button::D),
        Led::Button(Button::E),
        Led::Busy,
        Led::Network,
    ];

    /// Stable position in [`Led::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Led::Button(button) => button.index(),
            Led::Busy => 5,
            Led::Network => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedLevel {
    #[default]
    Off,
    On,
    /// Dimmed glow, the "working on it" visual.
    Glow,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("indicator {led:?}: {reason}")]
pub struct IndicatorError {
    pub led: Led,
    pub reason: String,
}

/// LED driver boundary.
pub trait Indicators {
    fn set(&mut self, led: Led, level: LedLevel) -> Result<(), IndicatorError>;
}

/// Orchestrator phases that get a progress LED, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Storage,
    Network,
    TimeSync,
    Update,
    Draw,
}

impl Phase {
    pub const fn led(self) -> Led {
        match self {
            Phase::Storage => Led::Button(Button::A),
            Phase::Network => Led::Button(Button::B),
            Phase::TimeSync => Led::Button(Button::C),
            Phase::Update => Led::Button(Button::D),
            Phase::Draw => Led::Button(Button::E),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Phase::Storage => "storage",
            Phase::Network => "network",
            Phase::TimeSync => "time sync",
            Phase::Update => "update",
            Phase::Draw => "draw",
        }
    }
}

/// Cosmetic progress display. Every LED failure is logged and dropped here,
/// so callers never see one.
pub struct ProgressIndicator<'a> {
    leds: &'a mut dyn Indicators,
}

impl<'a> ProgressIndicator<'a> {
    pub fn new(leds: &'a mut dyn Indicators) -> Self {
        Self { leds }
    }

    pub fn set(&mut self, led: Led, level: LedLevel) {
        if let Err(err) = self.leds.set(led, level) {
            log::warn!("ignoring LED failure: {}", err);
        }
    }

    /// Light the LED of `phase`. Earlier phases stay lit, so the row of
    /// button LEDs fills up as the cycle advances.
    pub fn enter(&mut self, phase: Phase) {
        log::info!("phase: {}", phase.name());
        self.set(phase.led(), LedLevel::On);
    }

    /// Turn off the five progress LEDs.
    pub fn clear_progress(&mut self) {
        for button in Button::ALL {
            self.set(Led::Button(button), LedLevel::Off);
        }
    }

    /// Turn off every LED.
    pub fn clear_all(&mut self) {
        for led in Led::ALL {
            self.set(led, LedLevel::Off);
        }
    }

    /// Chase the button LEDs left to right `rounds` times, ending dark.
    pub fn flash_buttons(&mut self, rounds: u32, step: Duration, delay: &mut dyn DelayNs) {
        for _ in 0..rounds {
            for button in Button::ALL {
                self.set(Led::Button(button), LedLevel::On);
                delay.delay_ms(millis(step));
                self.set(Led::Button(button), LedLevel::Off);
            }
        }
    }
}
