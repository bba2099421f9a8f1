//! Error types untuk simlink.
//!
//! Dua kelas error yang dipisah tegas:
//! - `DecodeError`: masalah per-frame, tidak pernah menghentikan pump
//! - `SessionError`: kegagalan open/close native session, dikembalikan
//!   langsung ke pemanggil `connect`/`disconnect`

use std::fmt;
use std::io;

use thiserror::Error;

use crate::protocol::ListShape;

/// Native status code (HRESULT-style) reported by the host bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostStatus(pub i32);

impl HostStatus {
    /// Generic failure (`E_FAIL`).
    pub const FAIL: HostStatus = HostStatus(0x8000_4005_u32 as i32);

    #[inline(always)]
    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0 as u32)
    }
}

/// Per-frame decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame (or its declared size) is shorter than its type requires.
    #[error("frame too small: tag {tag:?} has {len} bytes, needs at least {min}")]
    FrameTooSmall {
        tag: Option<u32>,
        len: usize,
        min: usize,
    },

    /// Header claims more bytes than the host actually handed out.
    #[error("declared frame size {declared} exceeds the {available} bytes available")]
    DeclaredSizeExceedsFrame { declared: usize, available: usize },

    /// List payload does not split evenly into the declared entry count.
    #[error("{shape} payload of {payload_len} bytes does not divide into {count} entries")]
    IndivisibleStride {
        shape: ListShape,
        payload_len: usize,
        count: usize,
    },

    /// Two different known layouts share the computed stride.
    #[error("{shape} stride {stride} matches more than one known layout")]
    AmbiguousStride { shape: ListShape, stride: usize },

    /// Computed stride matches no known layout and the policy refused to guess.
    #[error("{shape} stride {stride} ({count} entries) matches no known layout")]
    UnknownStride {
        shape: ListShape,
        stride: usize,
        count: usize,
    },
}

impl DecodeError {
    /// True for the stride-ambiguity family, which is surfaced to consumers
    /// instead of being discarded.
    pub fn is_stride_error(&self) -> bool {
        matches!(
            self,
            Self::IndivisibleStride { .. } | Self::AmbiguousStride { .. } | Self::UnknownStride { .. }
        )
    }
}

/// Invalid `BridgeConfig` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("queue capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("pump thread name must not be empty")]
    EmptyThreadName,

    #[error("capture capacity {0} is too small to hold a single frame")]
    CaptureTooSmall(usize),
}

/// Session-level failure, returned synchronously to the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("native open failed with status {status}")]
    Open { status: HostStatus },

    #[error("native close failed with status {status}")]
    Close { status: HostStatus },

    /// Teardown already requested (possibly by another thread). Benign no-op.
    #[error("session teardown already requested")]
    ShutdownRace,

    #[error("dispatch worker panicked")]
    WorkerPanicked,

    #[error("failed to spawn dispatch worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to create pump waker: {0}")]
    Waker(#[source] io::Error),

    #[error("frame capture error: {0}")]
    Capture(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias for session-level operations.
pub type Result<T> = std::result::Result<T, SessionError>;
