//! Core module: Lock-Free Ring Buffer, Message Queue, dan Mmap capture
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic operations, tidak ada Mutex/RwLock di jalur data
//! - No-Allocation: Slot ring buffer pre-allocated saat init
//! - Zero-Copy capture: Frame ditulis langsung ke region mmap

mod capture;
mod channel;
mod ring_buffer;

pub use capture::{
    CaptureFrames, CaptureReader, FrameCapture, CAPTURE_HEADER_SIZE, MIN_CAPTURE_CAPACITY,
};
pub use channel::{message_queue, Consumer, Producer, PushError, RecvTimeoutError, TryRecvError};
pub use ring_buffer::RingBuffer;
