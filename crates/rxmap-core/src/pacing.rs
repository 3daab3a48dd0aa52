//! Pause between records.

use std::thread;
use std::time::Duration;

/// Called once after every processed record.
pub trait Pacer {
    fn pause(&self);
}

/// Sleeps the calling thread for a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    fn pause(&self) {
        if !self.0.is_zero() {
            thread::sleep(self.0);
        }
    }
}
