//! App contract and the static registry of selectable apps.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::fmt;
use core::time::Duration;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::frame::FrameBuffer;
use crate::http::{FetchError, HttpClient};
use crate::input::Button;
use crate::secrets::ApiConfig;

pub mod calendar;

/// Name of a selectable app, as persisted across power loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(String);

impl AppId {
    const MAX_LEN: usize = 32;

    /// Accepts 1..=32 characters of `[a-z0-9_-]`.
    pub fn parse(raw: &str) -> Option<AppId> {
        let valid = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
        valid.then(|| AppId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("unreadable response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    /// `draw` was called without a successful `update` first.
    #[error("nothing to draw, no successful update")]
    NotUpdated,
    #[error("render failed: {0}")]
    Render(String),
}

/// What every selectable app provides. The orchestrator calls `update` then
/// `draw`, once each per cycle.
pub trait InkApp {
    /// Fetch fresh content. The network is up; nothing may be rendered.
    fn update(&mut self, http: &mut dyn HttpClient) -> Result<(), UpdateError>;

    /// Render the content fetched by the last successful `update`. No network
    /// I/O. Fails with [`DrawError::NotUpdated`] if there is nothing to draw.
    fn draw(&self, frame: &mut FrameBuffer, now: NaiveDateTime) -> Result<(), DrawError>;

    /// Sleep between two refreshes.
    fn refresh_interval(&self) -> Duration;
}

/// One registered app.
pub struct AppEntry {
    pub id: &'static str,
    /// Menu label.
    pub label: &'static str,
    /// Launcher button that selects it.
    pub button: Button,
    pub build: fn(&ApiConfig) -> Box<dyn InkApp>,
}

impl fmt::Debug for AppEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEntry")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("button", &self.button)
            .finish_non_exhaustive()
    }
}

/// Closed set of apps the device knows how to run.
#[derive(Debug)]
pub struct Registry {
    entries: &'static [AppEntry],
}

impl Registry {
    pub const fn new(entries: &'static [AppEntry]) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, id: &AppId) -> Option<&'static AppEntry> {
        self.entries.iter().find(|entry| entry.id == id.as_str())
    }

    pub fn for_button(&self, button: Button) -> Option<&'static AppEntry> {
        self.entries.iter().find(|entry| entry.button == button)
    }
}

/// Apps shipped with the firmware.
pub static APPS: Registry = Registry::new(&[AppEntry {
    id: calendar::APP_ID,
    label: "CALENDAR",
    button: Button::A,
    build: calendar::build,
}]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_rejects_junk() {
        assert!(AppId::parse("calendar").is_some());
        assert!(AppId::parse("news-feed_2").is_some());
        assert!(AppId::parse("").is_none());
        assert!(AppId::parse("Calendar").is_none());
        assert!(AppId::parse("cal endar").is_none());
        assert!(AppId::parse(&"x".repeat(33)).is_none());
    }

    #[test]
    fn registry_resolves_by_id_and_button() {
        let id = AppId::parse("calendar").unwrap();
        assert_eq!(APPS.lookup(&id).map(|e| e.button), Some(Button::A));
        assert_eq!(APPS.for_button(Button::A).map(|e| e.id), Some("calendar"));
        assert!(APPS.for_button(Button::C).is_none());
        assert!(APPS.lookup(&AppId::parse("weather").unwrap()).is_none());
    }
}
