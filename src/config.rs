//! Bridge configuration
//!
//! Semua nilai adalah input saat konstruksi session; tidak ada yang diubah
//! setelah pump berjalan.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::MIN_CAPTURE_CAPACITY;
use crate::error::ConfigError;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(1);
pub const DEFAULT_THREAD_NAME: &str = "simlink-dispatch";
pub const DEFAULT_CAPTURE_CAPACITY: usize = 16 * 1024 * 1024;

/// What the decoder does with a list stride matching no known layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownStridePolicy {
    /// Surface `DecodeError::UnknownStride` to the consumer.
    #[default]
    Reject,
    /// Decode with the widest fitting known layout and flag the result.
    BestEffort,
}

/// Raw frame recording target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub path: PathBuf,
    /// Data region size in bytes (header excluded).
    pub capacity: usize,
}

impl CaptureConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capacity: DEFAULT_CAPTURE_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub queue_capacity: usize,
    /// Park time after an empty poll; zero means busy-poll.
    pub idle_wait: Duration,
    pub thread_name: String,
    pub pin_to_core: Option<usize>,
    pub unknown_stride: UnknownStridePolicy,
    pub capture: Option<CaptureConfig>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            idle_wait: DEFAULT_IDLE_WAIT,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            pin_to_core: None,
            unknown_stride: UnknownStridePolicy::Reject,
            capture: None,
        }
    }
}

impl BridgeConfig {
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_idle_wait(mut self, wait: Duration) -> Self {
        self.idle_wait = wait;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_pin_to_core(mut self, core: usize) -> Self {
        self.pin_to_core = Some(core);
        self
    }

    pub fn with_unknown_stride(mut self, policy: UnknownStridePolicy) -> Self {
        self.unknown_stride = policy;
        self
    }

    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.thread_name.is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        if let Some(capture) = &self.capture {
            if capture.capacity < MIN_CAPTURE_CAPACITY {
                return Err(ConfigError::CaptureTooSmall(capture.capacity));
            }
        }
        Ok(())
    }
}
