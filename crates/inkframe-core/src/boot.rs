//! Launcher-or-resume decision made at every power-up.

use crate::app::{AppId, Registry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootMode {
    /// Show the menu and wait for a pick.
    Launcher,
    /// Run the saved app.
    Resume(AppId),
}

/// Pure decision over button state and the saved selection.
pub struct BootModeSelector<'a> {
    registry: &'a Registry,
}

impl<'a> BootModeSelector<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// The combo always wins. Otherwise a saved id resumes only if the
    /// registry still knows it.
    pub fn select(&self, combo_held: bool, persisted: Option<AppId>) -> BootMode {
        if combo_held {
            return BootMode::Launcher;
        }
        match persisted {
            Some(id) if self.registry.lookup(&id).is_some() => BootMode::Resume(id),
            Some(id) => {
                log::warn!("boot: saved app {} is not installed", id);
                BootMode::Launcher
            }
            None => BootMode::Launcher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::APPS;
    use crate::mock::MemoryStateStore;
    use crate::state::{encode, PersistedState};

    fn id(raw: &str) -> AppId {
        AppId::parse(raw).unwrap()
    }

    #[test]
    fn combo_forces_launcher() {
        let selector = BootModeSelector::new(&APPS);
        assert_eq!(selector.select(true, Some(id("calendar"))), BootMode::Launcher);
        assert_eq!(selector.select(true, None), BootMode::Launcher);
    }

    #[test]
    fn known_selection_resumes() {
        let selector = BootModeSelector::new(&APPS);
        assert_eq!(
            selector.select(false, Some(id("calendar"))),
            BootMode::Resume(id("calendar"))
        );
    }

    #[test]
    fn unknown_or_missing_selection_falls_back_to_launcher() {
        let selector = BootModeSelector::new(&APPS);
        assert_eq!(selector.select(false, Some(id("weather"))), BootMode::Launcher);
        assert_eq!(selector.select(false, None), BootMode::Launcher);
    }

    #[test]
    fn stored_record_drives_mode() {
        let valid = encode(&id("calendar"));
        let cases: [(Option<&str>, bool); 4] = [
            (Some(valid.as_str()), true),
            (None, false),
            (Some("inkframe-state v1\napp=cal"), false),
            (Some(""), false),
        ];
        let selector = BootModeSelector::new(&APPS);
        for (contents, resumes) in cases {
            let mut store = MemoryStateStore::with_contents(contents);
            let persisted = PersistedState::new(&mut store).load();
            let mode = selector.select(false, persisted);
            assert_eq!(matches!(mode, BootMode::Resume(_)), resumes, "{:?}", contents);
        }
    }
}
