//! Menu mode: show the registered apps, wait for a pick, save it.
//!
//! The launcher never runs an app. A pick is saved and the cycle ends; the
//! firmware restarts and the next boot resumes the saved app from a clean
//! state.

use alloc::format;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X13},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use embedded_hal::delay::DelayNs;

use crate::app::{AppId, Registry};
use crate::config::{millis, LauncherTiming};
use crate::error::CycleError;
use crate::frame::{FrameBuffer, Panel};
use crate::indicator::{Indicators, Led, LedLevel, ProgressIndicator};
use crate::input::{Button, ButtonSet, Buttons};
use crate::state::{PersistedState, StateStore};
use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

const TITLE_HEIGHT: i32 = 60;
const SLOT_TOP: i32 = 110;
const SLOT_SPACING: i32 = 60;
const TEXT_LEFT: i32 = 24;
const FOOTER_HINT: &str = "Hold A + E, then press Reset, to return to the Launcher";

/// Draw the menu: one slot per button, unbound slots marked as such.
pub fn render_menu(frame: &mut FrameBuffer, registry: &Registry) {
    frame.clear();
    let big_black = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let big_white = MonoTextStyle::new(&FONT_10X20, BinaryColor::Off);
    let small_black = MonoTextStyle::new(&FONT_6X13, BinaryColor::On);

    // Drawing into the frame buffer cannot fail.
    let _ = Rectangle::new(Point::zero(), Size::new(DISPLAY_WIDTH, TITLE_HEIGHT as u32))
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(frame);
    let _ = Text::with_baseline(
        "Launcher",
        Point::new(TEXT_LEFT, TITLE_HEIGHT / 2),
        big_white,
        Baseline::Middle,
    )
    .draw(frame);

    for (row, button) in Button::ALL.into_iter().enumerate() {
        let label = match registry.for_button(button) {
            Some(entry) => format!("{}. {}", button.label(), entry.label),
            None => format!("{}. ... to be updated", button.label()),
        };
        let y = SLOT_TOP + SLOT_SPACING * row as i32;
        let _ = Text::with_baseline(&label, Point::new(TEXT_LEFT, y), big_black, Baseline::Middle)
            .draw(frame);
    }

    let _ = Text::with_baseline(
        FOOTER_HINT,
        Point::new(TEXT_LEFT, DISPLAY_HEIGHT as i32 - 12),
        small_black,
        Baseline::Bottom,
    )
    .draw(frame);
}

/// The poll loop's only exit: a held button bound to a valid app id.
pub fn selection(registry: &Registry, pressed: ButtonSet) -> Option<(Button, AppId)> {
    pressed.iter().find_map(|button| {
        let entry = registry.for_button(button)?;
        AppId::parse(entry.id).map(|id| (button, id))
    })
}

pub struct Launcher<'a> {
    registry: &'a Registry,
    timing: LauncherTiming,
    panel: &'a mut dyn Panel,
    buttons: &'a mut dyn Buttons,
    leds: &'a mut dyn Indicators,
    store: &'a mut dyn StateStore,
    delay: &'a mut dyn DelayNs,
}

impl<'a> Launcher<'a> {
    pub fn new(
        registry: &'a Registry,
        timing: LauncherTiming,
        panel: &'a mut dyn Panel,
        buttons: &'a mut dyn Buttons,
        leds: &'a mut dyn Indicators,
        store: &'a mut dyn StateStore,
        delay: &'a mut dyn DelayNs,
    ) -> Self {
        Self {
            registry,
            timing,
            panel,
            buttons,
            leds,
            store,
            delay,
        }
    }

    /// Show the menu and block until a pick is saved. No timeout.
    /// `held_at_boot` is the button snapshot the boot mode was chosen from.
    pub fn run(
        &mut self,
        frame: &mut FrameBuffer,
        held_at_boot: ButtonSet,
    ) -> Result<AppId, CycleError> {
        log::info!("launcher: showing menu");
        ProgressIndicator::new(&mut *self.leds).set(Led::Busy, LedLevel::On);
        render_menu(frame, self.registry);
        self.panel.show(frame)?;
        ProgressIndicator::new(&mut *self.leds).set(Led::Busy, LedLevel::Off);

        let (button, id) = self.wait_for_selection(held_at_boot);
        log::info!("launcher: {:?} selects {}", button, id);

        ProgressIndicator::new(&mut *self.leds).set(Led::Button(button), LedLevel::On);
        PersistedState::new(&mut *self.store).save(&id)?;
        self.delay.delay_ms(millis(self.timing.settle));
        Ok(id)
    }

    fn wait_for_selection(&mut self, held_at_boot: ButtonSet) -> (Button, AppId) {
        // A + E held to enter the launcher must be let go first, or it would
        // pick slot A straight away.
        let mut armed = !held_at_boot.holds_launcher_combo();
        loop {
            let pressed = self.buttons.pressed();
            if !armed {
                armed = pressed.is_empty();
            } else if let Some(picked) = selection(self.registry, pressed) {
                return picked;
            }
            self.delay.delay_ms(millis(self.timing.poll));
        }
    }
}
