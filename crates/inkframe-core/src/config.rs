//! Tunable timings and paths for one boot cycle.
//!
//! Everything the orchestrator waits on is named here, so the firmware and
//! the host tests drive the same numbers.

use core::time::Duration;

/// Earliest year a synchronised clock may report. Anything older means the
/// time source never got a fix.
pub const MIN_PLAUSIBLE_YEAR: i32 = 2024;

/// Budget for one network join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Status polls before giving up.
    pub max_attempts: u32,
    /// Wait between status polls.
    pub poll_delay: Duration,
    /// Round-trip an outbound request before calling the link connected.
    pub validate_reachability: bool,
    /// Probe tries per joined status.
    pub validation_attempts: u32,
    /// Wait between probe tries.
    pub validation_delay: Duration,
    /// Longest a single probe may take. Charged in full against the budget.
    pub probe_timeout: Duration,
}

impl ConnectPolicy {
    pub const DEFAULT: ConnectPolicy = ConnectPolicy {
        max_attempts: 15,
        poll_delay: Duration::from_secs(4),
        validate_reachability: true,
        validation_attempts: 3,
        validation_delay: Duration::from_secs(1),
        probe_timeout: Duration::from_secs(5),
    };

    /// Upper bound on the time a connect may take. Zero sets no bound.
    pub fn budget(&self) -> Duration {
        self.poll_delay.saturating_mul(self.max_attempts)
    }
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LauncherTiming {
    /// Button poll period while the menu is up.
    pub poll: Duration,
    /// Pause after saving a selection, before the restart.
    pub settle: Duration,
}

impl LauncherTiming {
    pub const DEFAULT: LauncherTiming = LauncherTiming {
        poll: Duration::from_millis(50),
        settle: Duration::from_millis(500),
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepTiming {
    /// Rounds of the "cycle complete" LED chase on USB power.
    pub flash_rounds: u32,
    /// Time each LED stays lit during the chase.
    pub flash_step: Duration,
    /// Pause between releasing peripherals and sleeping.
    pub settle: Duration,
}

impl SleepTiming {
    pub const DEFAULT: SleepTiming = SleepTiming {
        flash_rounds: 10,
        flash_step: Duration::from_millis(100),
        settle: Duration::from_secs(1),
    };
}

/// All knobs of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleConfig {
    pub connect: ConnectPolicy,
    pub launcher: LauncherTiming,
    pub sleep: SleepTiming,
    pub mount_point: &'static str,
    pub secrets_file: &'static str,
}

impl CycleConfig {
    pub const DEFAULT: CycleConfig = CycleConfig {
        connect: ConnectPolicy::DEFAULT,
        launcher: LauncherTiming::DEFAULT,
        sleep: SleepTiming::DEFAULT,
        mount_point: "/sdcard",
        secrets_file: "secrets.py",
    };
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whole milliseconds of `duration`, saturating, for `DelayNs::delay_ms`.
pub fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_one_minute() {
        assert_eq!(ConnectPolicy::DEFAULT.budget(), Duration::from_secs(60));
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_millis(250)), 250);
        assert_eq!(millis(Duration::from_secs(u64::MAX)), u32::MAX);
    }
}
