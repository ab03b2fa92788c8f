//! Bounded-retry network join with optional reachability validation.
//!
//! `Idle -> Connecting -> {Connected | Failed}`. A link that is joined but
//! cannot reach the outside world does not count as connected; the outer
//! poll loop keeps going. Every wait, including probe retries and the
//! post-join settle, and every probe's full timeout are charged against one
//! budget of `max_attempts * poll_delay`, so `connect` always returns within
//! it.

use alloc::string::String;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use thiserror::Error;

use crate::config::{millis, ConnectPolicy};
use crate::indicator::{Indicators, Led, LedLevel, ProgressIndicator};

/// Low-level radio failure. Never surfaced past the connector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RadioError(pub String);

/// Wireless station interface.
pub trait Radio {
    /// Power the radio up in station mode.
    fn activate(&mut self) -> Result<(), RadioError>;
    /// Start joining. Returns without waiting for the link.
    fn join(&mut self, ssid: &str, credential: &str) -> Result<(), RadioError>;
    /// Link is up and has an address.
    fn is_joined(&mut self) -> bool;
    /// Leave the network and power the radio down. Safe to call when idle.
    fn deactivate(&mut self) -> Result<(), RadioError>;
    fn is_active(&self) -> bool;
}

/// One outbound round-trip to a known endpoint.
pub trait ReachabilityProbe {
    /// Must give up within `timeout`.
    fn probe(&mut self, timeout: Duration) -> Result<(), RadioError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Wrong credential, no access point and a dead uplink all end here.
    #[error("no validated connection after {attempts} attempts")]
    Timeout { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Failed,
}

/// Per-call retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub attempts_remaining: u32,
    pub validated: bool,
}

/// Time left for one `connect`, spent by waits and by probe timeouts.
struct Budget {
    remaining: Duration,
    /// A zero budget sets no bound; the attempt count alone ends the loop.
    bounded: bool,
}

impl Budget {
    fn new(total: Duration) -> Self {
        Self {
            remaining: total,
            bounded: !total.is_zero(),
        }
    }

    /// Spend `wanted`, clipped to what is left. Returns what was granted.
    fn take(&mut self, wanted: Duration) -> Duration {
        if !self.bounded {
            return wanted;
        }
        let slice = wanted.min(self.remaining);
        self.remaining -= slice;
        slice
    }

    fn exhausted(&self) -> bool {
        self.bounded && self.remaining.is_zero()
    }

    /// Sleep `wanted`, clipped to what is left. False once the budget is spent.
    fn wait(&mut self, delay: &mut dyn DelayNs, wanted: Duration) -> bool {
        let slice = self.take(wanted);
        delay.delay_ms(millis(slice));
        !self.exhausted()
    }
}

pub struct NetworkConnector<'a> {
    radio: &'a mut dyn Radio,
    probe: &'a mut dyn ReachabilityProbe,
    leds: &'a mut dyn Indicators,
    delay: &'a mut dyn DelayNs,
    state: LinkState,
}

impl<'a> NetworkConnector<'a> {
    pub fn new(
        radio: &'a mut dyn Radio,
        probe: &'a mut dyn ReachabilityProbe,
        leds: &'a mut dyn Indicators,
        delay: &'a mut dyn DelayNs,
    ) -> Self {
        Self {
            radio,
            probe,
            leds,
            delay,
            state: LinkState::Idle,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn connect(
        &mut self,
        ssid: &str,
        credential: &str,
        policy: &ConnectPolicy,
    ) -> Result<(), ConnectError> {
        self.state = LinkState::Connecting;
        ProgressIndicator::new(&mut *self.leds).set(Led::Network, LedLevel::Glow);
        log::info!("network: joining {}", ssid);

        if let Err(err) = self.radio.activate() {
            log::warn!("network: radio activation failed: {}", err);
        }

        let mut attempt = ConnectionAttempt {
            attempts_remaining: policy.max_attempts,
            validated: false,
        };
        let mut budget = Budget::new(policy.budget());
        let mut join_issued = false;

        while attempt.attempts_remaining > 0 {
            attempt.attempts_remaining -= 1;
            let number = policy.max_attempts - attempt.attempts_remaining;

            if !join_issued {
                match self.radio.join(ssid, credential) {
                    Ok(()) => join_issued = true,
                    Err(err) => log::warn!("network: join request failed: {}", err),
                }
            }

            if join_issued && self.radio.is_joined() {
                attempt.validated =
                    !policy.validate_reachability || self.validate(policy, &mut budget);
                if attempt.validated {
                    break;
                }
                log::warn!("network: joined but endpoint unreachable");
            }

            log::info!(
                "network: attempt {}/{} not connected",
                number,
                policy.max_attempts
            );
            if attempt.attempts_remaining == 0 || !budget.wait(self.delay, policy.poll_delay) {
                break;
            }
        }

        ProgressIndicator::new(&mut *self.leds).set(Led::Network, LedLevel::Off);

        if attempt.validated {
            // Let DHCP and DNS settle before the first real request.
            budget.wait(self.delay, policy.poll_delay);
            self.state = LinkState::Connected;
            log::info!("network: connected to {}", ssid);
            Ok(())
        } else {
            self.state = LinkState::Failed;
            let attempts = policy.max_attempts - attempt.attempts_remaining;
            log::error!("network: gave up after {} attempts", attempts);
            Err(ConnectError::Timeout { attempts })
        }
    }

    pub fn disconnect(&mut self) {
        release(&mut *self.radio, &mut *self.leds);
        self.state = LinkState::Idle;
    }

    fn validate(&mut self, policy: &ConnectPolicy, budget: &mut Budget) -> bool {
        let tries = policy.validation_attempts.max(1);
        for attempt in 1..=tries {
            let timeout = budget.take(policy.probe_timeout);
            if timeout.is_zero() {
                return false;
            }
            match self.probe.probe(timeout) {
                Ok(()) => return true,
                Err(err) => log::warn!("network: probe {}/{} failed: {}", attempt, tries, err),
            }
            if attempt < tries && !budget.wait(self.delay, policy.validation_delay) {
                return false;
            }
        }
        false
    }
}

/// Power the radio down and darken the network LED. Idempotent; every
/// sleep and every fatal path goes through here.
pub fn release(radio: &mut dyn Radio, leds: &mut dyn Indicators) {
    if let Err(err) = radio.deactivate() {
        log::warn!("network: radio deactivation failed: {}", err);
    }
    ProgressIndicator::new(leds).set(Led::Network, LedLevel::Off);
}
