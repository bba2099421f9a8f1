//! Dispatch layer: pump thread dan session lifecycle

mod pump;
mod session;

pub use pump::{PumpState, PumpStats, PumpStatsSnapshot};
pub use session::{MessageStream, Session, SessionState};
