//! Game stopwatch seam.
//!
//! The session only reads the elapsed value once (at score submission) and
//! stops the watch once (on completion). The browser implementation lives in
//! `web::timer`.

use std::cell::Cell;

pub trait Stopwatch {
    /// Elapsed whole seconds; frozen once stopped.
    fn elapsed_secs(&self) -> u32;
    fn stop(&self);
}

/// Hand-driven stopwatch for tests and headless runs.
#[derive(Debug, Default)]
pub struct ManualStopwatch {
    elapsed: Cell<u32>,
    stopped: Cell<bool>,
    stop_calls: Cell<u32>,
}

impl ManualStopwatch {
    pub fn new(elapsed: u32) -> Self {
        Self { elapsed: Cell::new(elapsed), ..Self::default() }
    }

    /// Advance by `secs` unless stopped.
    pub fn advance(&self, secs: u32) {
        if !self.stopped.get() {
            self.elapsed.set(self.elapsed.get() + secs);
        }
    }

    pub fn is_stopped(&self) -> bool { self.stopped.get() }

    pub fn stop_calls(&self) -> u32 { self.stop_calls.get() }
}

impl Stopwatch for ManualStopwatch {
    fn elapsed_secs(&self) -> u32 { self.elapsed.get() }

    fn stop(&self) {
        self.stopped.set(true);
        self.stop_calls.set(self.stop_calls.get() + 1);
    }
}
