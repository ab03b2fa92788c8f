//! Button input abstraction.

/// Front-panel buttons, left to right. Each has an LED above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Button {
    A,
    B,
    C,
    D,
    E,
}

impl Button {
    pub const ALL: [Button; 5] = [Button::A, Button::B, Button::C, Button::D, Button::E];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn label(self) -> char {
        match self {
            Button::A => 'A',
            Button::B => 'B',
            Button::C => 'C',
            Button::D => 'D',
            Button::E => 'E',
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Held when the device resets to force the launcher, whatever was saved.
pub const LAUNCHER_COMBO: [Button; 2] = [Button::A, Button::E];

/// Snapshot of the buttons held at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const EMPTY: ButtonSet = ButtonSet(0);

    pub const fn of(buttons: &[Button]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < buttons.len() {
            bits |= buttons[i].bit();
            i += 1;
        }
        ButtonSet(bits)
    }

    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        ButtonSet(self.0 | button.bit())
    }

    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Held buttons in A..E order.
    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }

    /// True when every button of [`LAUNCHER_COMBO`] is down. Extra buttons
    /// do not cancel the override.
    pub fn holds_launcher_combo(self) -> bool {
        LAUNCHER_COMBO.iter().all(|b| self.contains(*b))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<T: IntoIterator<Item = Button>>(iter: T) -> Self {
        iter.into_iter().fold(ButtonSet::EMPTY, ButtonSet::with)
    }
}

/// Source of button state.
///
/// Implementations:
/// - GPIO inputs on the device
/// - `ScriptedButtons` for host tests
pub trait Buttons {
    /// Buttons held right now. Never blocks.
    fn pressed(&mut self) -> ButtonSet;
}
