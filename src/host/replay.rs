//! Replay host: memutar ulang frame dari file capture
//!
//! Setiap poll mengembalikan frame berikutnya; setelah habis host hanya
//! mengembalikan `Ok(None)` dan menandai `finished`.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{HostStatus, NativeHost};
use crate::core::CaptureReader;
use crate::protocol::RawFrame;

/// `NativeHost` backed by a `CaptureReader`.
pub struct ReplayHost {
    reader: CaptureReader,
    offset: usize,
    served: u64,
    finished: Arc<AtomicBool>,
}

impl ReplayHost {
    pub fn new(reader: CaptureReader) -> Self {
        Self {
            reader,
            offset: 0,
            served: 0,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn open_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(CaptureReader::open(path)?))
    }

    /// Flag set by the pump thread on the first empty poll after the last frame.
    ///
    /// Saat flag terbaca `true`, semua frame sudah di-decode dan di-push.
    pub fn finished_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.finished)
    }

    pub fn frames_served(&self) -> u64 {
        self.served
    }
}

impl NativeHost for ReplayHost {
    fn open(&mut self) -> Result<(), HostStatus> {
        self.offset = 0;
        self.served = 0;
        self.finished.store(false, Ordering::Release);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>, HostStatus> {
        match self.reader.frame_at(self.offset) {
            Some((frame, next)) => {
                self.offset = next;
                self.served += 1;
                Ok(Some(RawFrame::new(frame)))
            }
            None => {
                self.finished.store(true, Ordering::Release);
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> Result<(), HostStatus> {
        Ok(())
    }
}
