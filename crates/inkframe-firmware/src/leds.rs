//! Indicator LEDs on LEDC PWM channels, so "glow" can be a dim level.

use esp_idf_svc::hal::ledc::LedcDriver;

use inkframe_core::indicator::IndicatorError;
use inkframe_core::{Indicators, Led, LedLevel};

const GLOW_DIVISOR: u32 = 8;

pub struct LedBank<'d> {
    channels: Vec<(Led, LedcDriver<'d>)>,
}

impl<'d> LedBank<'d> {
    pub fn new(channels: Vec<(Led, LedcDriver<'d>)>) -> Self {
        Self { channels }
    }
}

impl Indicators for LedBank<'_> {
    fn set(&mut self, led: Led, level: LedLevel) -> Result<(), IndicatorError> {
        let (_, driver) = self
            .channels
            .iter_mut()
            .find(|(l, _)| *l == led)
            .ok_or_else(|| IndicatorError {
                led,
                reason: String::from("no channel wired"),
            })?;
        let max = driver.get_max_duty();
        let duty = match level {
            LedLevel::Off => 0,
            LedLevel::On => max,
            LedLevel::Glow => max / GLOW_DIVISOR,
        };
        driver.set_duty(duty).map_err(|err| IndicatorError {
            led,
            reason: format!("{}", err),
        })
    }
}
