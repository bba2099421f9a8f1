//! Message Queue: bounded blocking hand-off di atas RingBuffer
//!
//! - Satu `Producer` (pump), satu `Consumer` (aplikasi); keduanya tidak `Clone`
//!   dan tidak `Sync`, jadi push dan pop tidak pernah berjalan paralel dengan
//!   dirinya sendiri. Keduanya tetap `Send`.
//! - Push memblok saat penuh (backpressure), pop memblok saat kosong
//! - Close terjadi sekali; consumer melihat end-of-stream setelah buffer habis
//!
//! Blocking memakai backoff spin → yield → park pendek, tanpa Mutex.

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::ring_buffer::RingBuffer;

const SPIN_LIMIT: u32 = 64;
const YIELD_LIMIT: u32 = 128;
const MAX_PARK: Duration = Duration::from_micros(500);

/// `Send` tapi `!Sync`: satu handle, satu thread pada satu waktu.
type NotSync = PhantomData<Cell<()>>;

struct Shared<T> {
    ring: RingBuffer<T>,
    consumer_alive: AtomicBool,
}

/// Create a bounded FIFO with the given capacity.
///
/// # Panics
/// Panic jika `capacity == 0`
pub fn message_queue<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let shared = Arc::new(Shared {
        ring: RingBuffer::new(capacity),
        consumer_alive: AtomicBool::new(true),
    });
    (
        Producer {
            shared: Arc::clone(&shared),
            _not_sync: PhantomData,
        },
        Consumer {
            shared,
            _not_sync: PhantomData,
        },
    )
}

/// Adaptive wait used while the ring is full (producer) or empty (consumer).
struct Backoff {
    step: u32,
}

impl Backoff {
    fn new() -> Self {
        Self { step: 0 }
    }

    #[inline(always)]
    fn snooze(&mut self) {
        if self.step < SPIN_LIMIT {
            std::hint::spin_loop();
        } else if self.step < YIELD_LIMIT {
            thread::yield_now();
        } else {
            let exp = (self.step - YIELD_LIMIT).min(9);
            thread::park_timeout(Duration::from_micros(1 << exp).min(MAX_PARK));
        }
        self.step = self.step.saturating_add(1);
    }
}

/// Why a push did not complete. The rejected value is handed back.
#[derive(Debug, PartialEq, Eq)]
pub enum PushError<T> {
    Full(T),
    Closed(T),
    /// Consumer side was dropped; nobody will ever read the value.
    Disconnected(T),
    Aborted(T),
}

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(v) | PushError::Closed(v) | PushError::Disconnected(v) | PushError::Aborted(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    Empty,
    /// Closed and fully drained.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    Timeout,
    Closed,
}

/// Producer half. Dropping it closes the queue.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
    _not_sync: NotSync,
}

impl<T> Producer<T> {
    /// Non-blocking push.
    pub fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        if self.shared.ring.is_closed() {
            return Err(PushError::Closed(value));
        }
        if !self.shared.consumer_alive.load(Ordering::Acquire) {
            return Err(PushError::Disconnected(value));
        }
        // SAFETY: Producer unik (tidak Clone) dan !Sync, jadi hanya ada satu
        // pemanggil push pada satu waktu
        unsafe { self.shared.ring.push(value) }.map_err(PushError::Full)
    }

    /// Blocking push: tunggu sampai ada slot, kecuali queue closed, consumer
    /// hilang, atau `abort()` mengembalikan true.
    pub fn push(&self, value: T, abort: impl Fn() -> bool) -> Result<(), PushError<T>> {
        let mut value = value;
        let mut backoff = Backoff::new();
        loop {
            match self.try_push(value) {
                Err(PushError::Full(v)) => {
                    if abort() {
                        return Err(PushError::Aborted(v));
                    }
                    value = v;
                    backoff.snooze();
                }
                other => return other,
            }
        }
    }

    /// Close the queue. Returns `true` for the first caller only.
    pub fn close(&self) -> bool {
        self.shared.ring.close()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.ring.is_closed()
    }

    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.shared.ring.close();
    }
}

/// Consumer half: the single ordered message stream.
///
/// Bisa dipindah ke thread lain, tapi tidak bisa dipakai dari dua thread
/// sekaligus:
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<simlink::core::Consumer<String>>();
/// ```
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    _not_sync: NotSync,
}

impl<T> Consumer<T> {
    #[inline(always)]
    fn pop(&self) -> Option<T> {
        // SAFETY: Consumer unik (tidak Clone) dan !Sync, jadi hanya ada satu
        // pemanggil pop pada satu waktu
        unsafe { self.shared.ring.pop() }
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        if let Some(v) = self.pop() {
            return Ok(v);
        }
        if self.shared.ring.is_closed() {
            // Producer bisa push tepat sebelum close: cek sekali lagi
            return self.pop().ok_or(TryRecvError::Closed);
        }
        Err(TryRecvError::Empty)
    }

    /// Block until a value arrives; `None` means end-of-stream.
    pub fn recv(&self) -> Option<T> {
        let mut backoff = Backoff::new();
        loop {
            match self.try_recv() {
                Ok(v) => return Some(v),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => backoff.snooze(),
            }
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut backoff = Backoff::new();
        loop {
            match self.try_recv() {
                Ok(v) => return Ok(v),
                Err(TryRecvError::Closed) => return Err(RecvTimeoutError::Closed),
                Err(TryRecvError::Empty) => {
                    if Instant::now() >= deadline {
                        return Err(RecvTimeoutError::Timeout);
                    }
                    backoff.snooze();
                }
            }
        }
    }

    /// True once the producer closed the queue (items may still be buffered).
    pub fn is_closed(&self) -> bool {
        self.shared.ring.is_closed()
    }

    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }
}

impl<T> Iterator for Consumer<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv()
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        self.shared.consumer_alive.store(false, Ordering::Release);
    }
}
