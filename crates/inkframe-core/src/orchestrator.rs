//! One boot cycle, start to finish.
//!
//! ```text
//! buttons -> mode -> Launcher: menu, save pick            -> restart
//!                 -> Resume:   mount, secrets, network,
//!                              time, update, draw, sleep  -> restart
//! ```
//!
//! Every fatal error lands in [`LifecycleOrchestrator::recover`]: LEDs off,
//! radio off, one diagnostic screen. The caller restarts the device for
//! every [`CycleEnd`]; nothing is retried or resumed mid-sequence.

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::app::{AppId, Registry};
use crate::boot::{BootMode, BootModeSelector};
use crate::config::CycleConfig;
use crate::diagnostics;
use crate::error::CycleError;
use crate::frame::{FrameBuffer, Panel};
use crate::http::HttpClient;
use crate::indicator::{Indicators, Phase, ProgressIndicator};
use crate::input::{ButtonSet, Buttons};
use crate::launcher::Launcher;
use crate::network::{self, NetworkConnector, Radio, ReachabilityProbe};
use crate::power::{PowerControl, PowerScheduler, SleepReport};
use crate::secrets::Secrets;
use crate::state::{PersistedState, StateStore};
use crate::storage::{mount_with_retry, MountMode, Storage};
use crate::time_sync::{SystemClock, TimeSource, TimeSynchronizer};

/// Every peripheral the cycle touches. Built at boot, dropped at restart.
pub struct Device<'a> {
    pub buttons: &'a mut dyn Buttons,
    pub leds: &'a mut dyn Indicators,
    pub panel: &'a mut dyn Panel,
    pub storage: &'a mut dyn Storage,
    pub state: &'a mut dyn StateStore,
    pub radio: &'a mut dyn Radio,
    pub probe: &'a mut dyn ReachabilityProbe,
    pub http: &'a mut dyn HttpClient,
    pub time_source: &'a mut dyn TimeSource,
    pub clock: &'a mut dyn SystemClock,
    pub power: &'a mut dyn PowerControl,
    pub delay: &'a mut dyn DelayNs,
}

/// How a cycle ended. All three end in a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEnd {
    /// The launcher saved a pick; the next boot resumes it.
    SelectionSaved(AppId),
    /// The app refreshed and the device slept.
    Slept(SleepReport),
    /// A step failed; the diagnostic is on screen.
    Failed(CycleError),
}

impl fmt::Display for CycleEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleEnd::SelectionSaved(id) => write!(f, "selected {}", id),
            CycleEnd::Slept(report) => write!(
                f,
                "woke after {:?} sleep of {} s",
                report.strategy,
                report.interval.as_secs()
            ),
            CycleEnd::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

pub struct LifecycleOrchestrator<'a> {
    device: Device<'a>,
    registry: &'a Registry,
    config: CycleConfig,
    frame: FrameBuffer,
}

impl<'a> LifecycleOrchestrator<'a> {
    pub fn new(device: Device<'a>, registry: &'a Registry, config: CycleConfig) -> Self {
        Self {
            device,
            registry,
            config,
            frame: FrameBuffer::new(),
        }
    }

    /// Last frame pushed to the panel.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn run_cycle(&mut self) -> CycleEnd {
        ProgressIndicator::new(&mut *self.device.leds).clear_all();

        let pressed = self.device.buttons.pressed();
        let persisted = PersistedState::new(&mut *self.device.state).load();
        let mode =
            BootModeSelector::new(self.registry).select(pressed.holds_launcher_combo(), persisted);
        log::info!("boot: mode={:?}", mode);

        let result = match mode {
            BootMode::Launcher => self.launcher(pressed).map(CycleEnd::SelectionSaved),
            BootMode::Resume(id) => self.resume(&id).map(CycleEnd::Slept),
        };
        result.unwrap_or_else(|err| self.recover(err))
    }

    fn launcher(&mut self, held_at_boot: ButtonSet) -> Result<AppId, CycleError> {
        let device = &mut self.device;
        Launcher::new(
            self.registry,
            self.config.launcher,
            &mut *device.panel,
            &mut *device.buttons,
            &mut *device.leds,
            &mut *device.state,
            &mut *device.delay,
        )
        .run(&mut self.frame, held_at_boot)
    }

    fn resume(&mut self, id: &AppId) -> Result<SleepReport, CycleError> {
        let entry = self
            .registry
            .lookup(id)
            .ok_or_else(|| CycleError::UnknownApp(id.clone()))?;
        let config = self.config;
        let device = &mut self.device;

        ProgressIndicator::new(&mut *device.leds).enter(Phase::Storage);
        mount_with_retry(&mut *device.storage, config.mount_point, MountMode::ReadWrite)?;
        let secrets = Secrets::load(&mut *device.storage, config.mount_point, config.secrets_file)?;

        ProgressIndicator::new(&mut *device.leds).enter(Phase::Network);
        NetworkConnector::new(
            &mut *device.radio,
            &mut *device.probe,
            &mut *device.leds,
            &mut *device.delay,
        )
        .connect(&secrets.network_ssid, &secrets.network_credential, &config.connect)?;

        ProgressIndicator::new(&mut *device.leds).enter(Phase::TimeSync);
        TimeSynchronizer::new(&mut *device.time_source, &mut *device.clock).sync()?;

        let mut app = (entry.build)(&secrets.api);

        ProgressIndicator::new(&mut *device.leds).enter(Phase::Update);
        app.update(&mut *device.http)?;

        ProgressIndicator::new(&mut *device.leds).enter(Phase::Draw);
        app.draw(&mut self.frame, device.clock.now())?;
        device.panel.show(&self.frame)?;
        ProgressIndicator::new(&mut *device.leds).clear_progress();

        let source = device.power.power_source();
        let report = PowerScheduler::new(
            config.sleep,
            &mut *device.power,
            &mut *device.radio,
            &mut *device.leds,
            &mut *device.delay,
        )
        .schedule_sleep(app.refresh_interval(), source)?;
        Ok(report)
    }

    /// The single recovery point.
    fn recover(&mut self, err: CycleError) -> CycleEnd {
        log::error!("cycle failed: {}", err);
        let device = &mut self.device;
        ProgressIndicator::new(&mut *device.leds).clear_all();
        network::release(&mut *device.radio, &mut *device.leds);
        let message = alloc::format!("{}\n\nRestarting.", err);
        if let Err(panel_err) =
            diagnostics::show_error(&mut self.frame, &mut *device.panel, &message)
        {
            log::error!("cannot show diagnostic: {}", panel_err);
        }
        CycleEnd::Failed(err)
    }
}
