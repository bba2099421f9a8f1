//! Session: connect / disconnect state machine
//!
//! ```text
//!   connect ──► Connected ──CAS──► Closing ──► Closed
//!                               ▲
//!      disconnect() kedua / konkuren: ShutdownRace (no-op)
//! ```
//! Urutan teardown pemenang CAS: cancel → wake → join pump → host.close().
//! Native close tidak pernah berjalan selama pump masih bisa poll.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use mio::{Poll, Waker};

use super::pump::{Pump, PumpControl, PumpState, PumpStatsSnapshot, WAKE_TOKEN};
use crate::config::BridgeConfig;
use crate::core::{message_queue, Consumer, FrameCapture};
use crate::error::{Result, SessionError};
use crate::host::NativeHost;
use crate::protocol::{Decoder, TypedMessage};

/// The single ordered stream of decoded messages.
///
/// `Send` tapi tidak `Sync`: pindahkan ke thread consumer, jangan dibagi.
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<simlink::MessageStream>();
/// ```
pub type MessageStream = Consumer<TypedMessage>;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connected = 0,
    Closing = 1,
    Closed = 2,
}

impl SessionState {
    #[inline(always)]
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connected,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Live connection to a native host.
///
/// `Session` adalah `Sync`: `disconnect` boleh dipanggil dari banyak thread,
/// hanya satu yang benar-benar melakukan teardown.
pub struct Session<H: NativeHost> {
    state: AtomicU8,
    control: Arc<PumpControl>,
    worker: Mutex<Option<JoinHandle<H>>>,
    thread_name: String,
}

impl<H: NativeHost> Session<H> {
    /// Open `host` on a dedicated pump thread and start dispatching.
    ///
    /// Returns after the native open completed on the pump thread.
    pub fn connect(host: H, config: BridgeConfig) -> Result<(Self, MessageStream)> {
        config.validate()?;

        let capture = match &config.capture {
            Some(c) => Some(FrameCapture::create(&c.path, c.capacity).map_err(SessionError::Capture)?),
            None => None,
        };

        let poll = Poll::new().map_err(SessionError::Waker)?;
        let waker = Waker::new(poll.registry(), WAKE_TOKEN).map_err(SessionError::Waker)?;
        let control = Arc::new(PumpControl::new(waker));

        let (producer, stream) = message_queue(config.queue_capacity);
        let pump = Pump {
            host,
            decoder: Decoder::new(config.unknown_stride),
            producer,
            poll,
            idle_wait: config.idle_wait,
            pin_to_core: config.pin_to_core,
            capture,
            control: Arc::clone(&control),
        };

        let (opened_tx, opened_rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || pump.run(opened_tx))
            .map_err(SessionError::Spawn)?;

        match opened_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(status)) => {
                // Pump sudah keluar sendiri; host tanpa session tidak di-close
                if worker.join().is_err() {
                    tracing::error!(%status, "dispatch pump panicked after failed open");
                }
                tracing::error!(%status, "native open failed");
                return Err(SessionError::Open { status });
            }
            Err(_) => {
                if worker.join().is_err() {
                    tracing::error!("dispatch pump panicked before reporting open");
                } else {
                    tracing::error!("dispatch pump exited before reporting open");
                }
                return Err(SessionError::WorkerPanicked);
            }
        }

        tracing::debug!(
            thread = %config.thread_name,
            queue_capacity = config.queue_capacity,
            "session connected"
        );

        let session = Self {
            state: AtomicU8::new(SessionState::Connected as u8),
            control,
            worker: Mutex::new(Some(worker)),
            thread_name: config.thread_name,
        };
        Ok((session, stream))
    }

    /// Stop the pump and close the native session.
    ///
    /// Hanya pemanggil pertama yang melakukan teardown; pemanggil lain
    /// (berurutan maupun konkuren) mendapat `SessionError::ShutdownRace`.
    pub fn disconnect(&self) -> Result<()> {
        if self
            .state
            .compare_exchange(
                SessionState::Connected as u8,
                SessionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!("disconnect lost the teardown race");
            return Err(SessionError::ShutdownRace);
        }
        self.teardown()
    }

    fn teardown(&self) -> Result<()> {
        tracing::debug!(thread = %self.thread_name, "session closing");
        self.control.cancel();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let result = match worker.map(JoinHandle::join) {
            Some(Ok(mut host)) => host.close().map_err(|status| SessionError::Close { status }),
            Some(Err(_)) => Err(SessionError::WorkerPanicked),
            // Tidak terjadi: worker hanya diambil oleh pemenang CAS
            None => Ok(()),
        };

        self.state.store(SessionState::Closed as u8, Ordering::Release);
        match &result {
            Ok(()) => tracing::debug!("session closed"),
            Err(e) => tracing::error!(error = %e, "session teardown failed"),
        }
        result
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    pub fn pump_state(&self) -> PumpState {
        self.control.state()
    }

    pub fn stats(&self) -> PumpStatsSnapshot {
        self.control.stats.snapshot()
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }
}

impl<H: NativeHost> Drop for Session<H> {
    fn drop(&mut self) {
        if self.state() == SessionState::Connected {
            // Error sudah di-log oleh teardown
            let _ = self.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostProbe, HostStatus, ScriptedHost, Step};
    use crate::protocol::{FrameBuilder, MessageTag};
    use std::time::Duration;

    fn quick_config() -> BridgeConfig {
        BridgeConfig::default().with_idle_wait(Duration::from_millis(1))
    }

    #[test]
    fn test_connect_delivers_and_disconnect_closes_once() {
        let frames = vec![FrameBuilder::new(MessageTag::Quit).finish()];
        let host = ScriptedHost::from_frames(frames);
        let probe = host.probe();

        let (session, stream) = Session::connect(host, quick_config()).unwrap();
        assert!(session.is_connected());

        let message = stream.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(message.is_quit());

        session.disconnect().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.pump_state(), PumpState::Closed);
        assert!(matches!(session.disconnect(), Err(SessionError::ShutdownRace)));
        assert_eq!(probe.opens(), 1);
        assert_eq!(probe.closes(), 1);

        // Pump menutup queue saat keluar
        assert_eq!(stream.recv(), None);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let probe = HostProbe::new();
        probe.fail_open(HostStatus::FAIL);
        let host = ScriptedHost::with_probe(vec![Step::Empty], Arc::clone(&probe));

        match Session::connect(host, quick_config()) {
            Err(SessionError::Open { status }) => assert_eq!(status, HostStatus::FAIL),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("connect should fail"),
        }
        assert_eq!(probe.polls(), 0);
        assert_eq!(probe.closes(), 0);
    }

    struct PanicOnOpen;

    impl NativeHost for PanicOnOpen {
        fn open(&mut self) -> std::result::Result<(), HostStatus> {
            panic!("native open blew up");
        }

        fn next_frame(&mut self) -> std::result::Result<Option<crate::protocol::RawFrame<'_>>, HostStatus> {
            Ok(None)
        }

        fn close(&mut self) -> std::result::Result<(), HostStatus> {
            Ok(())
        }
    }

    #[test]
    fn test_panic_during_open_is_reported() {
        match Session::connect(PanicOnOpen, quick_config()) {
            Err(SessionError::WorkerPanicked) => {}
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("connect should fail"),
        }
    }

    #[test]
    fn test_close_failure_is_reported() {
        let host = ScriptedHost::new(Vec::new());
        let probe = host.probe();
        probe.fail_close(HostStatus(-1));

        let (session, _stream) = Session::connect(host, quick_config()).unwrap();
        assert!(matches!(
            session.disconnect(),
            Err(SessionError::Close { status: HostStatus(-1) })
        ));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_drop_tears_down() {
        let host = ScriptedHost::new(Vec::new());
        let probe = host.probe();
        {
            let (_session, _stream) = Session::connect(host, quick_config()).unwrap();
        }
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let host = ScriptedHost::new(Vec::new());
        let probe = host.probe();
        let config = quick_config().with_queue_capacity(0);

        assert!(matches!(Session::connect(host, config), Err(SessionError::Config(_))));
        assert_eq!(probe.opens(), 0);
    }
}
