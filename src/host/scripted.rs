//! Scripted fake host
//!
//! Menyajikan frame dari script yang sudah disusun, lalu `Ok(None)` terus
//! setelah script habis. Semua interaksi dicatat di `HostProbe` yang bisa
//! dibagi ke thread test.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use super::{HostStatus, NativeHost};
use crate::protocol::RawFrame;

/// One scripted poll result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Frame(Vec<u8>),
    Empty,
    Fail(HostStatus),
}

/// Shared record of host interactions.
#[derive(Debug, Default)]
pub struct HostProbe {
    opens: AtomicU64,
    closes: AtomicU64,
    polls: AtomicU64,
    frames_served: AtomicU64,
    // 0 = sukses, selain itu status yang dikembalikan
    open_status: AtomicI32,
    close_status: AtomicI32,
    poll_threads: Mutex<Vec<ThreadId>>,
}

impl HostProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `open` calls fail with `status`.
    pub fn fail_open(&self, status: HostStatus) {
        self.open_status.store(status.code(), Ordering::Release);
    }

    pub fn fail_close(&self, status: HostStatus) {
        self.close_status.store(status.code(), Ordering::Release);
    }

    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::Acquire)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::Acquire)
    }

    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Acquire)
    }

    pub fn frames_served(&self) -> u64 {
        self.frames_served.load(Ordering::Acquire)
    }

    /// Distinct threads that called `next_frame`, in first-seen order.
    pub fn poll_threads(&self) -> Vec<ThreadId> {
        self.poll_threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::AcqRel);
        let id = thread::current().id();
        let mut threads = self
            .poll_threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !threads.contains(&id) {
            threads.push(id);
        }
    }
}

fn status_result(code: i32) -> Result<(), HostStatus> {
    match code {
        0 => Ok(()),
        code => Err(HostStatus(code)),
    }
}

/// Fake `NativeHost` driven by a fixed script.
pub struct ScriptedHost {
    script: VecDeque<Step>,
    current: Vec<u8>,
    probe: Arc<HostProbe>,
}

impl ScriptedHost {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self::with_probe(script, HostProbe::new())
    }

    pub fn with_probe(script: impl IntoIterator<Item = Step>, probe: Arc<HostProbe>) -> Self {
        Self {
            script: script.into_iter().collect(),
            current: Vec::new(),
            probe,
        }
    }

    /// Script serving each frame once, in order.
    pub fn from_frames(frames: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self::new(frames.into_iter().map(Step::Frame))
    }

    pub fn probe(&self) -> Arc<HostProbe> {
        Arc::clone(&self.probe)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl NativeHost for ScriptedHost {
    fn open(&mut self) -> Result<(), HostStatus> {
        self.probe.opens.fetch_add(1, Ordering::AcqRel);
        status_result(self.probe.open_status.load(Ordering::Acquire))
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>, HostStatus> {
        self.probe.record_poll();
        match self.script.pop_front() {
            Some(Step::Frame(bytes)) => {
                self.probe.frames_served.fetch_add(1, Ordering::AcqRel);
                self.current = bytes;
                Ok(Some(RawFrame::new(&self.current)))
            }
            Some(Step::Fail(status)) => Err(status),
            Some(Step::Empty) | None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), HostStatus> {
        self.probe.closes.fetch_add(1, Ordering::AcqRel);
        status_result(self.probe.close_status.load(Ordering::Acquire))
    }
}
