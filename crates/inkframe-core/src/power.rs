//! End-of-cycle sleep.
//!
//! On USB power the device naps in light sleep and a button press can wake
//! it early. On battery it arms the wake timer and cuts power; the next thing
//! that runs is a cold boot. Either way the radio goes down first.

use alloc::string::String;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use thiserror::Error;

use crate::config::{millis, SleepTiming};
use crate::indicator::{Indicators, ProgressIndicator};
use crate::network::{self, Radio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSource {
    Usb,
    Battery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepStrategy {
    /// Light sleep, interruptible by the buttons.
    Interruptible,
    /// Power down until the wake timer fires.
    Deep,
}

impl PowerSource {
    pub const fn strategy(self) -> SleepStrategy {
        match self {
            PowerSource::Usb => SleepStrategy::Interruptible,
            PowerSource::Battery => SleepStrategy::Deep,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PowerError(pub String);

pub trait PowerControl {
    fn power_source(&mut self) -> PowerSource;
    /// Arm a wake-up `after` from now. The alarm survives power-down.
    fn arm_wake_timer(&mut self, after: Duration) -> Result<(), PowerError>;
    /// Block in light sleep until the timer or a button fires.
    fn light_sleep(&mut self) -> Result<(), PowerError>;
    /// Cut power. Does not return on hardware; host doubles record the call
    /// and return.
    fn power_down(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepReport {
    pub strategy: SleepStrategy,
    pub interval: Duration,
}

pub struct PowerScheduler<'a> {
    timing: SleepTiming,
    power: &'a mut dyn PowerControl,
    radio: &'a mut dyn Radio,
    leds: &'a mut dyn Indicators,
    delay: &'a mut dyn DelayNs,
}

impl<'a> PowerScheduler<'a> {
    pub fn new(
        timing: SleepTiming,
        power: &'a mut dyn PowerControl,
        radio: &'a mut dyn Radio,
        leds: &'a mut dyn Indicators,
        delay: &'a mut dyn DelayNs,
    ) -> Self {
        Self {
            timing,
            power,
            radio,
            leds,
            delay,
        }
    }

    pub fn schedule_sleep(
        &mut self,
        interval: Duration,
        source: PowerSource,
    ) -> Result<SleepReport, PowerError> {
        let strategy = source.strategy();
        log::info!(
            "power: {:?} sleep for {} min on {:?}",
            strategy,
            interval.as_secs() / 60,
            source
        );
        network::release(&mut *self.radio, &mut *self.leds);

        match strategy {
            SleepStrategy::Interruptible => {
                let mut progress = ProgressIndicator::new(&mut *self.leds);
                progress.flash_buttons(self.timing.flash_rounds, self.timing.flash_step, &mut *self.delay);
                progress.clear_all();
                self.delay.delay_ms(millis(self.timing.settle));
                self.power.arm_wake_timer(interval)?;
                self.power.light_sleep()?;
            }
            SleepStrategy::Deep => {
                ProgressIndicator::new(&mut *self.leds).clear_all();
                self.delay.delay_ms(millis(self.timing.settle));
                self.power.arm_wake_timer(interval)?;
                self.power.power_down();
            }
        }

        Ok(SleepReport { strategy, interval })
    }
}
