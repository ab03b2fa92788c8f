//! One-shot wall-clock sync.

use alloc::string::String;

use chrono::{Datelike, NaiveDateTime};
use thiserror::Error;

use crate::config::MIN_PLAUSIBLE_YEAR;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("time source unavailable: {0}")]
    Source(String),
    #[error("time source reported {0}, clock never set")]
    Implausible(NaiveDateTime),
    #[error("cannot set system clock: {0}")]
    Clock(String),
}

/// Trusted time, e.g. the RTC chip or an SNTP exchange.
pub trait TimeSource {
    fn read(&mut self) -> Result<NaiveDateTime, SyncError>;
}

/// The clock apps and the power scheduler read. UTC.
pub trait SystemClock {
    fn set(&mut self, now: NaiveDateTime) -> Result<(), SyncError>;
    fn now(&self) -> NaiveDateTime;
}

pub struct TimeSynchronizer<'a> {
    source: &'a mut dyn TimeSource,
    clock: &'a mut dyn SystemClock,
}

impl<'a> TimeSynchronizer<'a> {
    pub fn new(source: &'a mut dyn TimeSource, clock: &'a mut dyn SystemClock) -> Self {
        Self { source, clock }
    }

    /// Read the source once and set the system clock from it. No retries.
    pub fn sync(&mut self) -> Result<(), SyncError> {
        let now = self.source.read()?;
        if now.year() < MIN_PLAUSIBLE_YEAR {
            return Err(SyncError::Implausible(now));
        }
        self.clock.set(now)?;
        log::info!("time: clock set to {}", now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, MockTimeSource};
    use chrono::NaiveDate;

    fn at(year: i32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, 3, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn sets_clock_from_source() {
        let mut source = MockTimeSource::new(Ok(at(2025)));
        let mut clock = MockClock::new(at(2000));
        TimeSynchronizer::new(&mut source, &mut clock).sync().unwrap();
        assert_eq!(clock.now(), at(2025));
        assert_eq!(source.reads(), 1);
    }

    #[test]
    fn epoch_time_is_rejected() {
        let mut source = MockTimeSource::new(Ok(at(1970)));
        let mut clock = MockClock::new(at(2000));
        let err = TimeSynchronizer::new(&mut source, &mut clock).sync().unwrap_err();
        assert_eq!(err, SyncError::Implausible(at(1970)));
        assert_eq!(clock.now(), at(2000));
    }

    #[test]
    fn source_failure_is_not_retried() {
        let mut source = MockTimeSource::new(Err(SyncError::Source("no fix".into())));
        let mut clock = MockClock::new(at(2000));
        let result = TimeSynchronizer::new(&mut source, &mut clock).sync();
        assert!(matches!(result, Err(SyncError::Source(_))));
        assert_eq!(source.reads(), 1);
    }
}
