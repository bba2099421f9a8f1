//! simlink - Dispatch core untuk native simulation host
//!
//! Arsitektur:
//! - Pinned pump: satu OS thread memiliki host dan melakukan semua poll
//! - Bounds-checked decoding: frame biner → `TypedMessage` owned
//! - Runtime stride inference: layout entry list disimpulkan dari ukuran frame
//! - Lock-free queue: hand-off FIFO bounded ke consumer
//! - Idempotent teardown: native close tepat sekali, setelah pump berhenti

pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod protocol;

pub use config::{BridgeConfig, CaptureConfig, UnknownStridePolicy};
pub use dispatch::{MessageStream, PumpState, PumpStatsSnapshot, Session, SessionState};
pub use error::{ConfigError, DecodeError, HostStatus, SessionError};
pub use host::NativeHost;
pub use protocol::{Decoder, RawFrame, TypedMessage};
