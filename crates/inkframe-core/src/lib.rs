//! Boot and lifecycle core for the inkframe e-paper gadget.
//! Hardware independent: the firmware crate plugs real peripherals into the
//! traits defined here, host tests plug in the doubles from [`mock`].

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

extern crate alloc;

pub mod app;
pub mod boot;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod http;
pub mod indicator;
pub mod input;
pub mod launcher;
pub mod network;
pub mod orchestrator;
pub mod power;
pub mod secrets;
pub mod state;
pub mod storage;
pub mod time_sync;

#[cfg(any(feature = "std", test))]
pub mod mock;

pub use app::{AppEntry, AppId, InkApp, Registry, APPS};
pub use boot::{BootMode, BootModeSelector};
pub use config::{ConnectPolicy, CycleConfig, LauncherTiming, SleepTiming};
pub use error::CycleError;
pub use frame::{FrameBuffer, Panel, PanelError};
pub use indicator::{Indicators, Led, LedLevel, Phase, ProgressIndicator};
pub use input::{Button, ButtonSet, Buttons};
pub use network::{ConnectError, LinkState, NetworkConnector};
pub use orchestrator::{CycleEnd, Device, LifecycleOrchestrator};
pub use power::{PowerControl, PowerScheduler, PowerSource, SleepReport, SleepStrategy};
pub use state::PersistedState;
pub use time_sync::TimeSynchronizer;

/// Panel width in pixels (7.5" landscape).
pub const DISPLAY_WIDTH: u32 = 800;
/// Panel height in pixels.
pub const DISPLAY_HEIGHT: u32 = 480;
