//! Host doubles for every hardware boundary.
//!
//! Doubles can share a [`Journal`], an ordered log of the side effects that
//! matter for sequencing ("radio off before sleep"). Time never passes for
//! real: [`VirtualDelay`] only adds up what was asked of it.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::time::Duration;

use chrono::NaiveDateTime;
use embedded_hal::delay::DelayNs;

use crate::frame::{FrameBuffer, Panel, PanelError};
use crate::http::{FetchError, HttpClient, HttpResponse};
use crate::indicator::{IndicatorError, Indicators, Led, LedLevel};
use crate::input::{ButtonSet, Buttons};
use crate::network::{Radio, RadioError, ReachabilityProbe};
use crate::power::{PowerControl, PowerError, PowerSource};
use crate::state::{StateError, StateStore};
use crate::storage::{MountMode, Storage, StorageError};
use crate::time_sync::{SyncError, SystemClock, TimeSource};

/// Shared, ordered record of side effects.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    /// Both entries happened, `first` before `second`.
    pub fn before(&self, first: &str, second: &str) -> bool {
        matches!((self.position(first), self.position(second)), (Some(a), Some(b)) if a < b)
    }
}

/// `DelayNs` that accumulates virtual time instead of sleeping. Clones share
/// one clock, so other doubles can spend time on it too.
#[derive(Debug, Clone, Default)]
pub struct VirtualDelay {
    elapsed_ns: Rc<Cell<u64>>,
}

impl VirtualDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.get())
    }

    /// Let `time` pass without a delay call.
    pub fn advance(&self, time: Duration) {
        let ns = u64::try_from(time.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_ns.set(self.elapsed_ns.get().saturating_add(ns));
    }
}

impl DelayNs for VirtualDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(Duration::from_millis(u64::from(ms)));
    }
}

/// Plays back a fixed sequence of button snapshots, one per read.
#[derive(Debug)]
pub struct ScriptedButtons {
    script: VecDeque<ButtonSet>,
    reads: usize,
    max_reads: usize,
}

impl ScriptedButtons {
    /// Reads past the end of the script see nothing held.
    pub fn new(script: &[ButtonSet]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            reads: 0,
            max_reads: 10_000,
        }
    }

    /// Nothing held, ever.
    pub fn idle() -> Self {
        Self::new(&[])
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Buttons for ScriptedButtons {
    #[allow(clippy::panic)]
    fn pressed(&mut self) -> ButtonSet {
        self.reads += 1;
        if self.reads > self.max_reads {
            panic!("buttons polled {} times without a scripted press", self.reads);
        }
        self.script.pop_front().unwrap_or(ButtonSet::EMPTY)
    }
}

/// Remembers the current level of every LED and how often each was lit.
#[derive(Debug, Default)]
pub struct RecordingIndicators {
    levels: [LedLevel; 7],
    lit: [usize; 7],
    history: Vec<(Led, LedLevel)>,
    fail: bool,
}

impl RecordingIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `set` fail without changing anything.
    pub fn fail_all(&mut self, fail: bool) {
        self.fail = fail;
    }

    pub fn level(&self, led: Led) -> LedLevel {
        self.levels[led.index()]
    }

    pub fn all_off(&self) -> bool {
        self.levels.iter().all(|l| *l == LedLevel::Off)
    }

    pub fn times_lit(&self, led: Led) -> usize {
        self.lit[led.index()]
    }

    pub fn was_set(&self, led: Led, level: LedLevel) -> bool {
        self.history.contains(&(led, level))
    }
}

impl Indicators for RecordingIndicators {
    fn set(&mut self, led: Led, level: LedLevel) -> Result<(), IndicatorError> {
        if self.fail {
            return Err(IndicatorError {
                led,
                reason: "driver unplugged".to_string(),
            });
        }
        if level != LedLevel::Off {
            self.lit[led.index()] += 1;
        }
        self.levels[led.index()] = level;
        self.history.push((led, level));
        Ok(())
    }
}

/// Keeps a copy of every frame shown.
#[derive(Debug, Default)]
pub struct MockPanel {
    frames: Vec<FrameBuffer>,
    fail: bool,
    journal: Journal,
}

impl MockPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn fail(&mut self, fail: bool) {
        self.fail = fail;
    }

    pub fn refreshes(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.frames.last()
    }
}

impl Panel for MockPanel {
    fn show(&mut self, frame: &FrameBuffer) -> Result<(), PanelError> {
        if self.fail {
            return Err(PanelError("busy pin stuck".to_string()));
        }
        self.journal.record("panel:show");
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// In-memory card. Files are only readable while mounted.
#[derive(Debug, Default)]
pub struct MockStorage {
    files: BTreeMap<String, String>,
    mounted: Option<(String, MountMode)>,
    failing_mounts: u32,
    mount_calls: u32,
    journal: Journal,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    /// The next `count` mount calls fail.
    pub fn fail_next_mounts(&mut self, count: u32) {
        self.failing_mounts = count;
    }

    pub fn mount_calls(&self) -> u32 {
        self.mount_calls
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl Storage for MockStorage {
    fn mount(&mut self, mount_point: &str, mode: MountMode) -> Result<(), StorageError> {
        self.mount_calls += 1;
        if self.failing_mounts > 0 {
            self.failing_mounts -= 1;
            return Err(StorageError::MountFailed {
                mount_point: mount_point.to_string(),
                reason: "no card".to_string(),
            });
        }
        self.journal.record(format!("storage:mount {}", mount_point));
        self.mounted = Some((mount_point.to_string(), mode));
        Ok(())
    }

    fn unmount(&mut self, mount_point: &str) -> Result<(), StorageError> {
        self.journal.record(format!("storage:unmount {}", mount_point));
        self.mounted = None;
        Ok(())
    }

    fn read_to_string(&mut self, path: &str) -> Result<String, StorageError> {
        let (mount_point, _) = self.mounted.as_ref().ok_or(StorageError::NotMounted)?;
        if !path.starts_with(mount_point.as_str()) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

/// Non-volatile slot kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    contents: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
    journal: Journal,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: Option<&str>) -> Self {
        Self {
            contents: contents.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StateStore for MemoryStateStore {
    fn read(&mut self) -> Result<Option<String>, StateError> {
        if self.fail_reads {
            return Err(StateError::Read("bad sector".to_string()));
        }
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), StateError> {
        if self.fail_writes {
            return Err(StateError::Write("read-only".to_string()));
        }
        self.journal.record("state:write");
        self.writes += 1;
        self.contents = Some(contents.to_string());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StateError> {
        self.contents = None;
        Ok(())
    }
}

/// Station radio that joins after a set number of status polls.
#[derive(Debug, Default)]
pub struct MockRadio {
    joins_on_poll: Option<u32>,
    active: bool,
    join_requested: bool,
    failing_joins: u32,
    join_requests: u32,
    polls: u32,
    journal: Journal,
}

impl MockRadio {
    /// `is_joined` turns true on the `polls`-th status poll.
    pub fn joins_after(polls: u32) -> Self {
        Self {
            joins_on_poll: Some(polls),
            ..Self::default()
        }
    }

    pub fn never_joins() -> Self {
        Self::default()
    }

    /// Already up, as after a successful connect.
    pub fn connected() -> Self {
        Self {
            joins_on_poll: Some(0),
            active: true,
            join_requested: true,
            ..Self::default()
        }
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// The next `count` join requests fail.
    pub fn fail_join_requests(&mut self, count: u32) {
        self.failing_joins = count;
    }

    pub fn status_polls(&self) -> u32 {
        self.polls
    }

    pub fn join_requests(&self) -> u32 {
        self.join_requests
    }
}

impl Radio for MockRadio {
    fn activate(&mut self) -> Result<(), RadioError> {
        self.journal.record("radio:activate");
        self.active = true;
        Ok(())
    }

    fn join(&mut self, ssid: &str, _credential: &str) -> Result<(), RadioError> {
        self.join_requests += 1;
        if self.failing_joins > 0 {
            self.failing_joins -= 1;
            return Err(RadioError("association refused".to_string()));
        }
        self.journal.record(format!("radio:join {}", ssid));
        self.join_requested = true;
        Ok(())
    }

    fn is_joined(&mut self) -> bool {
        self.polls += 1;
        self.active
            && self.join_requested
            && self.joins_on_poll.is_some_and(|n| self.polls >= n)
    }

    fn deactivate(&mut self) -> Result<(), RadioError> {
        self.journal.record("radio:deactivate");
        self.active = false;
        self.join_requested = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Reachability probe with scripted outcomes.
#[derive(Debug, Default)]
pub struct MockProbe {
    script: VecDeque<bool>,
    fallback: bool,
    calls: u32,
    timeouts: Vec<Duration>,
    /// Each round-trip spends this long on the shared clock.
    latency: Option<(VirtualDelay, Duration)>,
}

impl MockProbe {
    pub fn reachable() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Plays `outcomes` in order, then keeps succeeding.
    pub fn scripted(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: outcomes.into_iter().collect(),
            fallback: true,
            ..Self::default()
        }
    }

    /// Reachable, but every round-trip takes `latency` on `clock`. A
    /// round-trip longer than the timeout it was given fails at the timeout.
    pub fn slow(clock: &VirtualDelay, latency: Duration) -> Self {
        Self {
            fallback: true,
            latency: Some((clock.clone(), latency)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// The timeout handed to each call, in order.
    pub fn timeouts(&self) -> &[Duration] {
        &self.timeouts
    }
}

impl ReachabilityProbe for MockProbe {
    fn probe(&mut self, timeout: Duration) -> Result<(), RadioError> {
        self.calls += 1;
        self.timeouts.push(timeout);
        if let Some((clock, latency)) = &self.latency {
            clock.advance((*latency).min(timeout));
            if *latency > timeout {
                return Err(RadioError("timed out".to_string()));
            }
        }
        if self.script.pop_front().unwrap_or(self.fallback) {
            Ok(())
        } else {
            Err(RadioError("no route to host".to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn has_header(&self, name: &str, value: &str) -> bool {
        self.headers.iter().any(|(n, v)| n == name && v == value)
    }
}

/// Answers every GET with the same canned result.
#[derive(Debug)]
pub struct MockHttp {
    response: Result<HttpResponse, FetchError>,
    requests: Vec<RecordedRequest>,
    journal: Journal,
}

impl MockHttp {
    pub fn responding(response: Result<HttpResponse, FetchError>) -> Self {
        Self {
            response,
            requests: Vec::new(),
            journal: Journal::new(),
        }
    }

    /// 200 with `body`.
    pub fn ok(body: &str) -> Self {
        Self::responding(Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        }))
    }

    /// Empty body with `status`.
    pub fn status(status: u16) -> Self {
        Self::responding(Ok(HttpResponse {
            status,
            body: Vec::new(),
        }))
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }
}

impl HttpClient for MockHttp {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        self.journal.record(format!("http:get {}", url));
        self.requests.push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        });
        self.response.clone()
    }
}

#[derive(Debug)]
pub struct MockTimeSource {
    result: Result<NaiveDateTime, SyncError>,
    reads: u32,
    journal: Journal,
}

impl MockTimeSource {
    pub fn new(result: Result<NaiveDateTime, SyncError>) -> Self {
        Self {
            result,
            reads: 0,
            journal: Journal::new(),
        }
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl TimeSource for MockTimeSource {
    fn read(&mut self) -> Result<NaiveDateTime, SyncError> {
        self.journal.record("time:read");
        self.reads += 1;
        self.result.clone()
    }
}

#[derive(Debug)]
pub struct MockClock {
    now: NaiveDateTime,
    sets: u32,
}

impl MockClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now, sets: 0 }
    }

    pub fn sets(&self) -> u32 {
        self.sets
    }
}

impl SystemClock for MockClock {
    fn set(&mut self, now: NaiveDateTime) -> Result<(), SyncError> {
        self.now = now;
        self.sets += 1;
        Ok(())
    }

    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// Power supply and sleep controller. `power_down` returns here.
#[derive(Debug)]
pub struct MockPower {
    source: PowerSource,
    armed: Option<Duration>,
    light_sleeps: u32,
    powered_down: bool,
    fail_arm: bool,
    journal: Journal,
}

impl MockPower {
    pub fn new(source: PowerSource) -> Self {
        Self {
            source,
            armed: None,
            light_sleeps: 0,
            powered_down: false,
            fail_arm: false,
            journal: Journal::new(),
        }
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn fail_arm(&mut self, fail: bool) {
        self.fail_arm = fail;
    }

    pub fn armed(&self) -> Option<Duration> {
        self.armed
    }

    pub fn light_sleeps(&self) -> u32 {
        self.light_sleeps
    }

    pub fn powered_down(&self) -> bool {
        self.powered_down
    }
}

impl PowerControl for MockPower {
    fn power_source(&mut self) -> PowerSource {
        self.source
    }

    fn arm_wake_timer(&mut self, after: Duration) -> Result<(), PowerError> {
        if self.fail_arm {
            return Err(PowerError("alarm register write failed".to_string()));
        }
        self.journal.record(format!("power:arm {}s", after.as_secs()));
        self.armed = Some(after);
        Ok(())
    }

    fn light_sleep(&mut self) -> Result<(), PowerError> {
        self.journal.record("power:light");
        self.light_sleeps += 1;
        Ok(())
    }

    fn power_down(&mut self) {
        self.journal.record("power:down");
        self.powered_down = true;
    }
}
