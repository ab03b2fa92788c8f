//! Single-screen error display used on every fatal path.

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
};
use embedded_text::{alignment::HorizontalAlignment, style::TextBoxStyleBuilder, TextBox};

use crate::frame::{FrameBuffer, Panel, PanelError};
use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

const MARGIN: i32 = 16;

/// Black word-wrapped text on white. Text that does not fit is cut off.
pub fn render_error(frame: &mut FrameBuffer, message: &str) {
    frame.clear();
    let bounds = Rectangle::new(
        Point::new(MARGIN, MARGIN),
        Size::new(
            DISPLAY_WIDTH - 2 * MARGIN as u32,
            DISPLAY_HEIGHT - 2 * MARGIN as u32,
        ),
    );
    let character_style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let textbox_style = TextBoxStyleBuilder::new()
        .alignment(HorizontalAlignment::Left)
        .build();
    // Drawing into the frame buffer cannot fail.
    let _ = TextBox::with_textbox_style(message, bounds, character_style, textbox_style)
        .draw(frame);
}

pub fn show_error(
    frame: &mut FrameBuffer,
    panel: &mut dyn Panel,
    message: &str,
) -> Result<(), PanelError> {
    render_error(frame, message);
    panel.show(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPanel;

    #[test]
    fn error_text_is_drawn_inside_margins() {
        let mut frame = FrameBuffer::new();
        render_error(&mut frame, "Could not mount the SD card");
        assert!(frame.black_pixels() > 0);
        for x in 0..DISPLAY_WIDTH {
            assert_eq!(frame.pixel(x, 0), BinaryColor::Off);
        }
    }

    #[test]
    fn long_messages_stay_on_one_screen() {
        let mut frame = FrameBuffer::new();
        render_error(&mut frame, &"overflow ".repeat(500));
        for x in 0..DISPLAY_WIDTH {
            assert_eq!(frame.pixel(x, DISPLAY_HEIGHT - 1), BinaryColor::Off);
        }
    }

    #[test]
    fn show_error_pushes_one_refresh() {
        let mut frame = FrameBuffer::new();
        let mut panel = MockPanel::new();
        show_error(&mut frame, &mut panel, "boom").unwrap();
        assert_eq!(panel.refreshes(), 1);
        assert!(!panel.last_frame().unwrap().is_blank());
    }
}
