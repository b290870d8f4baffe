// Browser stopwatch backed by performance.now().

use std::cell::Cell;

use web_sys::window;

use crate::clock::Stopwatch;

pub(crate) fn performance_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Whole seconds between two millisecond timestamps, never negative.
pub(crate) fn whole_seconds(start_ms: f64, end_ms: f64) -> u32 {
    let secs = ((end_ms - start_ms) / 1000.0).floor();
    if secs.is_nan() || secs <= 0.0 { 0 } else { secs as u32 }
}

pub struct PerformanceStopwatch {
    start_ms: f64,
    stopped_ms: Cell<Option<f64>>,
}

impl PerformanceStopwatch {
    pub fn start() -> Self {
        Self { start_ms: performance_now(), stopped_ms: Cell::new(None) }
    }

    pub fn is_running(&self) -> bool { self.stopped_ms.get().is_none() }
}

impl Stopwatch for PerformanceStopwatch {
    fn elapsed_secs(&self) -> u32 {
        let end = self.stopped_ms.get().unwrap_or_else(performance_now);
        whole_seconds(self.start_ms, end)
    }

    fn stop(&self) {
        if self.stopped_ms.get().is_none() {
            self.stopped_ms.set(Some(performance_now()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_floors_and_clamps() {
        assert_eq!(whole_seconds(1_000.0, 1_999.0), 0);
        assert_eq!(whole_seconds(1_000.0, 62_500.0), 61);
        assert_eq!(whole_seconds(5_000.0, 1_000.0), 0);
    }
}
