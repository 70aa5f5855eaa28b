//! Idle step between iterations.

use std::thread;
use std::time::Duration;

use tracing::debug;

/// Blocks the loop between iterations. Tests substitute a recorder.
pub trait Idler {
    fn idle(&self, duration: Duration);
}

/// Sleeps the calling thread.
pub struct ThreadIdler;

impl Idler for ThreadIdler {
    fn idle(&self, duration: Duration) {
        debug!(idle = ?duration, "idling");
        thread::sleep(duration);
    }
}
