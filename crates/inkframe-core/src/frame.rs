//! Off-screen frame buffer and the panel boundary.
//!
//! Apps, the launcher and the diagnostic screen draw into a [`FrameBuffer`]
//! with embedded-graphics, then the whole buffer is pushed to the panel in
//! one refresh. E-paper refreshes take seconds, so nothing draws straight to
//! the panel.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use thiserror::Error;

use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// 1 bit per pixel, MSB first, rows packed. A set bit is white, the layout
/// the panel controller expects.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    const WIDTH_BYTES: usize = (DISPLAY_WIDTH as usize).div_ceil(8);
    const BUFFER_SIZE: usize = Self::WIDTH_BYTES * DISPLAY_HEIGHT as usize;

    pub fn new() -> Self {
        Self {
            buffer: vec![0xFF; Self::BUFFER_SIZE], // White by default
        }
    }

    /// Clear buffer to white
    pub fn clear(&mut self) {
        self.buffer.fill(0xFF);
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }
        let (index, bit) = Self::locate(x, y);
        if color == BinaryColor::On {
            // Black: clear bit
            self.buffer[index] &= !(1 << bit);
        } else {
            self.buffer[index] |= 1 << bit;
        }
    }

    /// Out-of-range reads come back white.
    pub fn pixel(&self, x: u32, y: u32) -> BinaryColor {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return BinaryColor::Off;
        }
        let (index, bit) = Self::locate(x, y);
        if self.buffer[index] & (1 << bit) == 0 {
            BinaryColor::On
        } else {
            BinaryColor::Off
        }
    }

    /// Count of black pixels, handy for "did anything render" checks.
    pub fn black_pixels(&self) -> usize {
        self.buffer.iter().map(|b| b.count_zeros() as usize).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.iter().all(|b| *b == 0xFF)
    }

    /// Raw packed bytes, row-major.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    fn locate(x: u32, y: u32) -> (usize, u32) {
        let index = y as usize * Self::WIDTH_BYTES + x as usize / 8;
        (index, 7 - (x % 8))
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("black_pixels", &self.black_pixels())
            .finish()
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panel refresh failed: {0}")]
pub struct PanelError(pub String);

/// E-paper panel boundary: one full refresh per call.
pub trait Panel {
    fn show(&mut self, frame: &FrameBuffer) -> Result<(), PanelError>;
}
