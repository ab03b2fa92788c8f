//! Power-source sensing and the two sleep modes.

use core::time::Duration;

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver};
use esp_idf_svc::sys;

use inkframe_core::power::{PowerControl, PowerError, PowerSource};

fn check(what: &str, res: sys::esp_err_t) -> Result<(), PowerError> {
    if res == sys::ESP_OK {
        Ok(())
    } else {
        Err(PowerError(format!("{} failed: {}", what, res)))
    }
}

pub struct BoardPower<'d> {
    vbus: PinDriver<'d, AnyIOPin, Input>,
    /// GPIO mask of the buttons that may end a light sleep.
    wake_buttons: u64,
}

impl<'d> BoardPower<'d> {
    pub fn new(vbus: PinDriver<'d, AnyIOPin, Input>, wake_buttons: u64) -> Self {
        Self { vbus, wake_buttons }
    }
}

impl PowerControl for BoardPower<'_> {
    fn power_source(&mut self) -> PowerSource {
        if self.vbus.is_high() {
            PowerSource::Usb
        } else {
            PowerSource::Battery
        }
    }

    fn arm_wake_timer(&mut self, after: Duration) -> Result<(), PowerError> {
        let micros = u64::try_from(after.as_micros()).unwrap_or(u64::MAX);
        check("timer wakeup", unsafe {
            sys::esp_sleep_enable_timer_wakeup(micros)
        })
    }

    fn light_sleep(&mut self) -> Result<(), PowerError> {
        check("button wakeup", unsafe {
            sys::esp_sleep_enable_ext1_wakeup(
                self.wake_buttons,
                sys::esp_sleep_ext1_wakeup_mode_t_ESP_EXT1_WAKEUP_ANY_HIGH,
            )
        })?;
        check("light sleep", unsafe { sys::esp_light_sleep_start() })
    }

    fn power_down(&mut self) {
        log::info!("power: deep sleep");
        unsafe { sys::esp_deep_sleep_start() };
    }
}
