//! Dispatch Pump
//!
//! Satu OS thread khusus yang memiliki host selama session hidup:
//! ```text
//!   ┌──────────┐ next_frame ┌─────────┐ decode ┌─────────┐ push ┌──────────┐
//!   │  Native  │ ─────────► │  Pump   │ ─────► │ Decoder │ ───► │  Queue   │ ──► consumer
//!   │   Host   │ ◄───────── │ thread  │        └─────────┘      └──────────┘
//!   └──────────┘ RawFrame   └─────────┘
//!                             │ idle: mio Poll (Waker = cancel)
//! ```
//! Frame tidak pernah keluar dari thread ini; yang menyeberang hanya
//! `TypedMessage` yang sudah owned.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mio::{Events, Poll, Token, Waker};

use crate::core::{FrameCapture, Producer, PushError};
use crate::error::{DecodeError, HostStatus};
use crate::host::NativeHost;
use crate::protocol::{Decoder, TypedMessage};

pub(crate) const WAKE_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 8;

/// Pump lifecycle. Transitions only move forward.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PumpState {
    Idle = 0,
    Polling = 1,
    Draining = 2,
    Closed = 3,
}

impl PumpState {
    #[inline(always)]
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Polling,
            2 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

/// Pump counters (lock-free, updated only by the pump thread)
#[derive(Debug, Default)]
pub struct PumpStats {
    frames_received: AtomicU64,
    messages_delivered: AtomicU64,
    empty_polls: AtomicU64,
    poll_errors: AtomicU64,
    frames_discarded: AtomicU64,
    frames_undecodable: AtomicU64,
    unknown_tags: AtomicU64,
    dropped_on_shutdown: AtomicU64,
    frames_captured: AtomicU64,
}

impl PumpStats {
    #[inline(always)]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PumpStatsSnapshot {
        PumpStatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
            frames_undecodable: self.frames_undecodable.load(Ordering::Relaxed),
            unknown_tags: self.unknown_tags.load(Ordering::Relaxed),
            dropped_on_shutdown: self.dropped_on_shutdown.load(Ordering::Relaxed),
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `PumpStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStatsSnapshot {
    pub frames_received: u64,
    pub messages_delivered: u64,
    pub empty_polls: u64,
    pub poll_errors: u64,
    pub frames_discarded: u64,
    pub frames_undecodable: u64,
    pub unknown_tags: u64,
    pub dropped_on_shutdown: u64,
    pub frames_captured: u64,
}

impl fmt::Display for PumpStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames received:     {}", self.frames_received)?;
        writeln!(f, "messages delivered:  {}", self.messages_delivered)?;
        writeln!(f, "empty polls:         {}", self.empty_polls)?;
        writeln!(f, "poll errors:         {}", self.poll_errors)?;
        writeln!(f, "frames discarded:    {}", self.frames_discarded)?;
        writeln!(f, "frames undecodable:  {}", self.frames_undecodable)?;
        writeln!(f, "unknown tags:        {}", self.unknown_tags)?;
        writeln!(f, "dropped on shutdown: {}", self.dropped_on_shutdown)?;
        write!(f, "frames captured:     {}", self.frames_captured)
    }
}

/// State shared between the pump thread and its session.
#[derive(Debug)]
pub(crate) struct PumpControl {
    state: AtomicU8,
    cancel: AtomicBool,
    waker: Waker,
    pub(crate) stats: PumpStats,
}

impl PumpControl {
    pub(crate) fn new(waker: Waker) -> Self {
        Self {
            state: AtomicU8::new(PumpState::Idle as u8),
            cancel: AtomicBool::new(false),
            waker,
            stats: PumpStats::default(),
        }
    }

    #[inline(always)]
    pub(crate) fn state(&self) -> PumpState {
        PumpState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline(always)]
    fn set_state(&self, state: PumpState) {
        self.state.store(state as u8, Ordering::Release);
    }

    #[inline(always)]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Request cooperative stop and cut any idle wait short.
    pub(crate) fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
        if let Err(e) = self.waker.wake() {
            // Pump tetap berhenti setelah idle_wait habis
            tracing::warn!(error = %e, "failed to wake dispatch pump");
        }
    }
}

/// Everything the pump thread owns.
pub(crate) struct Pump<H: NativeHost> {
    pub(crate) host: H,
    pub(crate) decoder: Decoder,
    pub(crate) producer: Producer<TypedMessage>,
    pub(crate) poll: Poll,
    pub(crate) idle_wait: Duration,
    pub(crate) pin_to_core: Option<usize>,
    pub(crate) capture: Option<FrameCapture>,
    pub(crate) control: Arc<PumpControl>,
}

impl<H: NativeHost> Pump<H> {
    /// Thread body. Opens the host, reports the open result through
    /// `opened`, polls until cancelled, and hands the host back to the joiner.
    pub(crate) fn run(mut self, opened: mpsc::Sender<Result<(), HostStatus>>) -> H {
        if let Some(core) = self.pin_to_core {
            match pin_current_thread(core) {
                Ok(()) => tracing::debug!(core, "dispatch pump pinned"),
                Err(e) => tracing::warn!(core, error = %e, "failed to pin dispatch pump"),
            }
        }

        let open = self.host.open();
        let failed = open.is_err();
        // Receiver hilang berarti connect sudah menyerah; lanjutkan ke shutdown
        let _ = opened.send(open);
        if failed {
            self.finish();
            return self.host;
        }

        self.control.set_state(PumpState::Polling);
        tracing::debug!("dispatch pump polling");

        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        while !self.control.is_cancelled() {
            if !self.poll_once() {
                self.idle(&mut events);
            }
        }

        self.control.set_state(PumpState::Draining);
        tracing::debug!("dispatch pump draining");
        self.finish();
        self.host
    }

    /// One host poll. Returns `true` if a frame was received.
    #[inline(always)]
    fn poll_once(&mut self) -> bool {
        let stats = &self.control.stats;

        let decoded = match self.host.next_frame() {
            Ok(Some(frame)) => {
                PumpStats::bump(&stats.frames_received);
                tracing::trace!(len = frame.len(), "frame received");

                let captured = self.capture.as_mut().map(|c| c.append(frame.as_bytes()));
                match captured {
                    Some(true) => PumpStats::bump(&stats.frames_captured),
                    Some(false) => {
                        tracing::warn!("capture file full, recording stopped");
                        if let Some(capture) = self.capture.take() {
                            if let Err(e) = capture.flush() {
                                tracing::warn!(error = %e, "failed to flush capture");
                            }
                        }
                    }
                    None => {}
                }

                self.decoder.decode_or_surface(frame)
            }
            Ok(None) => {
                PumpStats::bump(&stats.empty_polls);
                return false;
            }
            Err(status) => {
                PumpStats::bump(&stats.poll_errors);
                tracing::warn!(%status, "native poll failed");
                return false;
            }
        };

        match decoded {
            Ok(message) => self.deliver(message),
            Err(error) => {
                PumpStats::bump(&stats.frames_discarded);
                log_discard(&error);
            }
        }
        true
    }

    fn deliver(&mut self, message: TypedMessage) {
        let stats = &self.control.stats;
        match &message {
            TypedMessage::Unknown(header) => {
                PumpStats::bump(&stats.unknown_tags);
                tracing::debug!(tag = header.tag, size = header.size, "unknown message tag");
            }
            TypedMessage::Undecodable(frame) => {
                PumpStats::bump(&stats.frames_undecodable);
                tracing::warn!(tag = frame.header.tag, error = %frame.error, "undecodable frame surfaced");
            }
            _ => {}
        }

        let control = &self.control;
        match self.producer.push(message, || control.is_cancelled()) {
            Ok(()) => PumpStats::bump(&stats.messages_delivered),
            Err(PushError::Disconnected(_)) | Err(PushError::Closed(_)) => {
                PumpStats::bump(&stats.dropped_on_shutdown);
                tracing::trace!("message stream dropped, message discarded");
            }
            Err(e) => {
                PumpStats::bump(&stats.dropped_on_shutdown);
                tracing::debug!(kind = ?e.into_inner().kind(), "message dropped on shutdown");
            }
        }
    }

    fn idle(&mut self, events: &mut Events) {
        if self.idle_wait.is_zero() {
            thread::yield_now();
            return;
        }
        match self.poll.poll(events, Some(self.idle_wait)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!(error = %e, "idle wait failed");
                thread::sleep(self.idle_wait);
            }
        }
    }

    fn finish(&mut self) {
        self.producer.close();
        if let Some(capture) = self.capture.take() {
            tracing::debug!(frames = capture.frames_written(), bytes = capture.bytes_written(), "capture closed");
            if let Err(e) = capture.flush() {
                tracing::warn!(error = %e, "failed to flush capture");
            }
        }
        self.control.set_state(PumpState::Closed);
        tracing::debug!("dispatch pump closed");
    }
}

fn log_discard(error: &DecodeError) {
    tracing::warn!(%error, "frame discarded");
}

#[cfg(target_os = "linux")]
fn pin_current_thread(core: usize) -> io::Result<()> {
    if core >= libc::CPU_SETSIZE as usize {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("core {core} out of range")));
    }
    // SAFETY: cpu_set_t adalah bitmask POD; pid 0 = thread pemanggil
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core, &mut set);
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn pin_current_thread(_core: usize) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "thread pinning is only supported on Linux"))
}
