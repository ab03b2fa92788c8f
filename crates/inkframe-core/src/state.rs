//! The one record that survives power loss: which app the user picked.
//!
//! Stored as a small text record:
//!
//! ```text
//! inkframe-state v1
//! app=calendar
//! crc=1a2b3c4d
//! ```
//!
//! The crc32 covers the `app=` line. A missing, truncated or corrupted
//! record reads as "no selection", never as an error.

use alloc::format;
use alloc::string::String;

use thiserror::Error;

use crate::app::AppId;

const HEADER: &str = "inkframe-state v1";
const APP_KEY: &str = "app=";
const CRC_KEY: &str = "crc=";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("state read failed: {0}")]
    Read(String),
    #[error("state write failed: {0}")]
    Write(String),
}

/// Non-volatile slot holding the encoded record. Writes replace the whole
/// value.
pub trait StateStore {
    /// `Ok(None)` when nothing was ever written.
    fn read(&mut self) -> Result<Option<String>, StateError>;
    fn write(&mut self, contents: &str) -> Result<(), StateError>;
    /// Removing an absent record is not an error.
    fn remove(&mut self) -> Result<(), StateError>;
}

pub struct PersistedState<'a> {
    store: &'a mut dyn StateStore,
}

impl<'a> PersistedState<'a> {
    pub fn new(store: &'a mut dyn StateStore) -> Self {
        Self { store }
    }

    /// The saved selection, if a valid record exists.
    pub fn load(&mut self) -> Option<AppId> {
        let contents = match self.store.read() {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("treating unreadable state as empty: {}", err);
                return None;
            }
        };
        let id = decode(&contents);
        if id.is_none() {
            log::warn!("discarding malformed state record");
        }
        id
    }

    pub fn save(&mut self, id: &AppId) -> Result<(), StateError> {
        self.store.write(&encode(id))?;
        log::info!("state: saved selection {}", id);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StateError> {
        self.store.remove()
    }
}

pub fn encode(id: &AppId) -> String {
    let app_line = format!("{}{}", APP_KEY, id);
    let crc = crc32fast::hash(app_line.as_bytes());
    format!("{}\n{}\n{}{:08x}\n", HEADER, app_line, CRC_KEY, crc)
}

pub fn decode(contents: &str) -> Option<AppId> {
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());
    if lines.next()? != HEADER {
        return None;
    }
    let app_line = lines.next()?;
    let crc_hex = lines.next()?.strip_prefix(CRC_KEY)?;
    if lines.next().is_some() {
        return None;
    }
    let crc = u32::from_str_radix(crc_hex, 16).ok()?;
    if crc != crc32fast::hash(app_line.as_bytes()) {
        return None;
    }
    AppId::parse(app_line.strip_prefix(APP_KEY)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryStateStore;

    fn calendar() -> AppId {
        AppId::parse("calendar").unwrap()
    }

    #[test]
    fn save_then_load_returns_same_id() {
        let mut store = MemoryStateStore::new();
        let mut state = PersistedState::new(&mut store);
        state.save(&calendar()).unwrap();
        assert_eq!(state.load(), Some(calendar()));
    }

    #[test]
    fn save_overwrites_previous_selection() {
        let mut store = MemoryStateStore::new();
        let mut state = PersistedState::new(&mut store);
        state.save(&AppId::parse("news").unwrap()).unwrap();
        state.save(&calendar()).unwrap();
        assert_eq!(state.load(), Some(calendar()));
    }

    #[test]
    fn missing_empty_and_corrupt_records_load_as_none() {
        for contents in [
            None,
            Some(""),
            Some("garbage"),
            Some("inkframe-state v1\napp=calendar\n"),
            Some("inkframe-state v1\napp=calendar\ncrc=00000000\n"),
            Some("inkframe-state v2\napp=calendar\ncrc=00000000\n"),
        ] {
            let mut store = MemoryStateStore::with_contents(contents);
            assert_eq!(PersistedState::new(&mut store).load(), None, "{:?}", contents);
        }
    }

    #[test]
    fn bit_flip_in_id_is_detected() {
        let encoded = encode(&calendar());
        let flipped = encoded.replace("app=calendar", "app=calendas");
        assert_eq!(decode(&flipped), None);
        assert_eq!(decode(&encoded), Some(calendar()));
    }

    #[test]
    fn read_failure_loads_as_none() {
        let mut store = MemoryStateStore::new();
        store.fail_reads(true);
        assert_eq!(PersistedState::new(&mut store).load(), None);
    }

    #[test]
    fn save_failure_propagates() {
        let mut store = MemoryStateStore::new();
        store.fail_writes(true);
        let err = PersistedState::new(&mut store).save(&calendar()).unwrap_err();
        assert!(matches!(err, StateError::Write(_)));
    }

    #[test]
    fn clear_removes_selection() {
        let mut store = MemoryStateStore::new();
        let mut state = PersistedState::new(&mut store);
        state.save(&calendar()).unwrap();
        state.clear().unwrap();
        assert_eq!(state.load(), None);
        state.clear().unwrap();
    }
}
