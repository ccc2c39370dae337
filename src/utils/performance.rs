//! Timing for editor operations
//!
//! Measures how long respacing and edits take so the presentation layer can
//! report interactive latency.

use std::collections::HashMap;

/// Milliseconds from an arbitrary fixed origin
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map_or(0.0, |performance| performance.now())
}

/// Milliseconds from an arbitrary fixed origin
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64() * 1000.0)
}

/// Running total of one operation's timings
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Timing {
    total_ms: f64,
    count: usize,
}

/// Performance monitor for measuring operation times
///
/// Only a running sum and count are kept per operation.
#[derive(Debug, Default, Clone)]
pub struct PerformanceMonitor {
    measurements: HashMap<String, Timing>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self { measurements: HashMap::new() }
    }

    pub fn record_measurement(&mut self, operation: &str, duration_ms: f32) {
        if !self.measurements.contains_key(operation) {
            self.measurements.insert(operation.to_string(), Timing::default());
        }
        if let Some(timing) = self.measurements.get_mut(operation) {
            timing.total_ms += duration_ms as f64;
            timing.count += 1;
        }
    }

    /// Runs `work`, recording its duration under `operation`
    pub fn measure<T>(&mut self, operation: &str, work: impl FnOnce() -> T) -> T {
        let start = now_ms();
        let result = work();
        self.record_measurement(operation, (now_ms() - start) as f32);
        result
    }

    pub fn get_average_time(&self, operation: &str) -> Option<f32> {
        self.measurements.get(operation).map(|timing| {
            if timing.count == 0 {
                0.0
            } else {
                (timing.total_ms / timing.count as f64) as f32
            }
        })
    }

    pub fn measurement_count(&self, operation: &str) -> usize {
        self.measurements.get(operation).map_or(0, |timing| timing.count)
    }
}
