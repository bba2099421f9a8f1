//! Native Host Boundary
//!
//! `NativeHost` adalah satu-satunya seam ke library native: open, poll
//! frame berikutnya, close. Binding FFI asli mengimplementasikan trait ini
//! di luar crate; di dalam crate ada dua implementasi:
//! - `ScriptedHost`: fake yang bisa di-script untuk test
//! - `ReplayHost`: memutar ulang frame dari file capture

mod replay;
mod scripted;

pub use crate::error::HostStatus;
pub use replay::ReplayHost;
pub use scripted::{HostProbe, ScriptedHost, Step};

use crate::protocol::RawFrame;

/// One native session.
///
/// Semua method dipanggil dari satu thread pump yang sama, kecuali `close`
/// yang dipanggil setelah pump di-join.
pub trait NativeHost: Send + 'static {
    /// Establish the native session.
    fn open(&mut self) -> Result<(), HostStatus>;

    /// Retrieve the next pending frame, if any.
    ///
    /// Frame yang dikembalikan hanya valid sampai pemanggilan berikutnya;
    /// lifetime `&mut self` menegakkan ini.
    fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>, HostStatus>;

    /// Tear down the native session.
    fn close(&mut self) -> Result<(), HostStatus>;
}
