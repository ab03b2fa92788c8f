//! 7.5" 800x480 e-paper panel behind the core `Panel` trait.

use epd_waveshare::{epd7in5_v2::Epd7in5, prelude::*};
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver};
use esp_idf_svc::hal::spi::{SpiDeviceDriver, SpiDriver};

use inkframe_core::{FrameBuffer, Panel, PanelError};

type PanelSpi<'d> = SpiDeviceDriver<'d, SpiDriver<'d>>;

type Driver<'d> = Epd7in5<
    PanelSpi<'d>,
    PinDriver<'d, AnyIOPin, Input>,
    PinDriver<'d, AnyOutputPin, Output>,
    PinDriver<'d, AnyOutputPin, Output>,
    FreeRtos,
>;

pub struct EpaperPanel<'d> {
    spi: PanelSpi<'d>,
    epd: Driver<'d>,
    delay: FreeRtos,
}

impl<'d> EpaperPanel<'d> {
    pub fn new(
        mut spi: PanelSpi<'d>,
        busy: PinDriver<'d, AnyIOPin, Input>,
        dc: PinDriver<'d, AnyOutputPin, Output>,
        rst: PinDriver<'d, AnyOutputPin, Output>,
    ) -> Result<Self, PanelError> {
        let mut delay = FreeRtos;
        let mut epd = Epd7in5::new(&mut spi, busy, dc, rst, &mut delay, None)
            .map_err(|err| PanelError(format!("init: {:?}", err)))?;
        // The controller idles in deep sleep between refreshes.
        epd.sleep(&mut spi, &mut delay)
            .map_err(|err| PanelError(format!("sleep: {:?}", err)))?;
        Ok(Self { spi, epd, delay })
    }
}

impl Panel for EpaperPanel<'_> {
    fn show(&mut self, frame: &FrameBuffer) -> Result<(), PanelError> {
        self.epd
            .wake_up(&mut self.spi, &mut self.delay)
            .map_err(|err| PanelError(format!("wake: {:?}", err)))?;
        self.epd
            .update_and_display_frame(&mut self.spi, frame.buffer(), &mut self.delay)
            .map_err(|err| PanelError(format!("refresh: {:?}", err)))?;
        self.epd
            .sleep(&mut self.spi, &mut self.delay)
            .map_err(|err| PanelError(format!("sleep: {:?}", err)))?;
        log::info!("panel: refreshed");
        Ok(())
    }
}
