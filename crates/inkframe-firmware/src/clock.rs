//! Wall clock: SNTP as the authoritative source, the libc clock as the
//! system clock.

use core::ptr;
use core::time::Duration;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use esp_idf_svc::sys;

use inkframe_core::time_sync::{SyncError, SystemClock, TimeSource};

const SNTP_POLL: Duration = Duration::from_millis(250);
const SNTP_TIMEOUT: Duration = Duration::from_secs(20);

pub struct SntpTimeSource;

impl TimeSource for SntpTimeSource {
    fn read(&mut self) -> Result<NaiveDateTime, SyncError> {
        let sntp = EspSntp::new_default().map_err(|err| SyncError::Source(format!("{}", err)))?;
        let mut waited = Duration::ZERO;
        while sntp.get_sync_status() != SyncStatus::Completed {
            if waited >= SNTP_TIMEOUT {
                return Err(SyncError::Source(String::from("no answer from time server")));
            }
            FreeRtos::delay_ms(SNTP_POLL.as_millis() as u32);
            waited += SNTP_POLL;
        }
        Ok(DateTime::<Utc>::from(SystemTime::now()).naive_utc())
    }
}

pub struct EspSystemClock;

impl SystemClock for EspSystemClock {
    fn set(&mut self, now: NaiveDateTime) -> Result<(), SyncError> {
        let utc = now.and_utc();
        let tv = sys::timeval {
            tv_sec: utc.timestamp() as _,
            tv_usec: utc.timestamp_subsec_micros() as _,
        };
        let res = unsafe { sys::settimeofday(&tv, ptr::null()) };
        if res != 0 {
            return Err(SyncError::Clock(format!("settimeofday returned {}", res)));
        }
        Ok(())
    }

    fn now(&self) -> NaiveDateTime {
        DateTime::<Utc>::from(SystemTime::now()).naive_utc()
    }
}
