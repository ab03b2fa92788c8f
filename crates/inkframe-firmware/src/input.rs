//! Front-panel buttons on plain GPIOs, active high with external pull-downs.

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_svc::sys::EspError;

use inkframe_core::{Button, ButtonSet, Buttons};

pub struct FrontButtons<'d> {
    pins: Vec<(Button, PinDriver<'d, AnyIOPin, Input>)>,
}

impl<'d> FrontButtons<'d> {
    /// `pins` in A..E order.
    pub fn new(pins: [AnyIOPin; 5]) -> Result<Self, EspError> {
        let mut drivers = Vec::with_capacity(pins.len());
        for (button, pin) in Button::ALL.into_iter().zip(pins) {
            let mut driver = PinDriver::input(pin)?;
            driver.set_pull(Pull::Down)?;
            drivers.push((button, driver));
        }
        Ok(Self { pins: drivers })
    }
}

impl Buttons for FrontButtons<'_> {
    fn pressed(&mut self) -> ButtonSet {
        self.pins
            .iter()
            .filter(|(_, pin)| pin.is_high())
            .map(|(button, _)| *button)
            .collect()
    }
}
